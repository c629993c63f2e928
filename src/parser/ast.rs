// Abstract Syntax Tree for plot calls

/// Argument value as written in a call
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Bare word, usually a column name
    Ident(String),
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Text of an identifier or string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Ident(s) | ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// A single name or a list of names
    pub fn as_names(&self) -> Option<Vec<String>> {
        match self {
            ArgValue::List(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
            other => other.as_str().map(|s| vec![s.to_string()]),
        }
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            ArgValue::Ident(s) => s.clone(),
            ArgValue::Str(s) => format!("\"{}\"", s),
            ArgValue::Number(n) => n.to_string(),
            ArgValue::Bool(b) => b.to_string(),
            ArgValue::Null => "null".to_string(),
            ArgValue::List(items) => {
                let inner: Vec<String> = items.iter().map(ArgValue::describe).collect();
                format!("[{}]", inner.join(", "))
            }
        }
    }
}

/// Named argument: `name: value`
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: ArgValue,
}

/// One plotting call, e.g. `hist(bins: 5, stacked: true)`
#[derive(Debug, Clone, PartialEq)]
pub struct PlotCall {
    pub kind: String,
    pub args: Vec<Argument>,
}

impl PlotCall {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }
}

/// Calls joined with `|`; each call becomes one layer
#[derive(Debug, Clone, PartialEq)]
pub struct PlotPipeline {
    pub calls: Vec<PlotCall>,
}
