//! Typed Vega-Lite (v2) document model.
//!
//! Every struct keeps an `extra` map (flattened into the JSON object) so a
//! caller can add properties this crate does not model before handing the
//! document to a renderer. Optional properties are skipped when unset, so a
//! document serialised and parsed back compares equal to the original.

use crate::error::Result;
use crate::infer::VegaType;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const SCHEMA_URL: &str = "https://vega.github.io/schema/vega-lite/v2.json";

/// Geometric primitive used to draw each datum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkType {
    Line,
    Point,
    Circle,
    Square,
    Bar,
    Area,
    Rect,
    Tick,
    Rule,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mark {
    Simple(MarkType),
    Detailed(MarkDef),
}

impl Mark {
    pub fn mark_type(&self) -> MarkType {
        match self {
            Mark::Simple(t) => *t,
            Mark::Detailed(def) => def.mark_type,
        }
    }

    /// Mark with step interpolation (step histograms)
    pub fn step(mark_type: MarkType) -> Self {
        Mark::Detailed(MarkDef {
            mark_type,
            interpolate: Some("step".to_string()),
            extra: Map::new(),
        })
    }
}

impl From<MarkType> for Mark {
    fn from(t: MarkType) -> Self {
        Mark::Simple(t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "type")]
    pub mark_type: MarkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpolate: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Encoding channel (visual role)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    X,
    Y,
    X2,
    Y2,
    Color,
    Opacity,
    Size,
    Shape,
    Detail,
    Order,
    Tooltip,
    Text,
    Row,
    Column,
}

impl Channel {
    pub fn name(&self) -> &'static str {
        match self {
            Channel::X => "x",
            Channel::Y => "y",
            Channel::X2 => "x2",
            Channel::Y2 => "y2",
            Channel::Color => "color",
            Channel::Opacity => "opacity",
            Channel::Size => "size",
            Channel::Shape => "shape",
            Channel::Detail => "detail",
            Channel::Order => "order",
            Channel::Tooltip => "tooltip",
            Channel::Text => "text",
            Channel::Row => "row",
            Channel::Column => "column",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let channel = match s {
            "x" => Channel::X,
            "y" => Channel::Y,
            "x2" => Channel::X2,
            "y2" => Channel::Y2,
            "color" => Channel::Color,
            "opacity" => Channel::Opacity,
            "size" => Channel::Size,
            "shape" => Channel::Shape,
            "detail" => Channel::Detail,
            "order" => Channel::Order,
            "tooltip" => Channel::Tooltip,
            "text" => Channel::Text,
            "row" => Channel::Row,
            "column" => Channel::Column,
            other => return Err(format!("unknown encoding channel '{}'", other)),
        };
        Ok(channel)
    }
}

/// Direction of a repeated field in a repeat (scatter matrix) spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatRef {
    Row,
    Column,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    Name(String),
    Repeat { repeat: RepeatRef },
}

impl FieldRef {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            FieldRef::Name(n) => Some(n),
            FieldRef::Repeat { .. } => None,
        }
    }
}

/// Aggregation applied to a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Count,
    Sum,
    Mean,
    Median,
    Min,
    Max,
}

impl Aggregate {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Mean => "mean",
            Aggregate::Median => "median",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

impl FromStr for Aggregate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "count" => Ok(Aggregate::Count),
            "sum" => Ok(Aggregate::Sum),
            "mean" | "average" => Ok(Aggregate::Mean),
            "median" => Ok(Aggregate::Median),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            other => Err(format!("unknown aggregate '{}'", other)),
        }
    }
}

/// Stack offset of a positional channel. `Disabled` is written as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOffset {
    Zero,
    Normalize,
    Center,
    Disabled,
}

impl Serialize for StackOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            StackOffset::Zero => serializer.serialize_str("zero"),
            StackOffset::Normalize => serializer.serialize_str("normalize"),
            StackOffset::Center => serializer.serialize_str("center"),
            StackOffset::Disabled => serializer.serialize_none(),
        }
    }
}

// A present `null` means stacking is switched off; an absent key is `None`.
fn deserialize_stack<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<StackOffset>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let offset = match raw.as_deref() {
        None => StackOffset::Disabled,
        Some("zero") => StackOffset::Zero,
        Some("normalize") => StackOffset::Normalize,
        Some("center") => StackOffset::Center,
        Some(other) => return Err(D::Error::custom(format!("unknown stack offset '{}'", other))),
    };
    Ok(Some(offset))
}

/// Definition of one encoding channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldRef>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub vtype: Option<VegaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_stack"
    )]
    pub stack: Option<StackOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Box<ChannelDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChannelDef {
    pub fn field(name: impl Into<String>, vtype: VegaType) -> Self {
        Self {
            field: Some(FieldRef::Name(name.into())),
            vtype: Some(vtype),
            ..Default::default()
        }
    }

    pub fn repeat(repeat: RepeatRef, vtype: VegaType) -> Self {
        Self {
            field: Some(FieldRef::Repeat { repeat }),
            vtype: Some(vtype),
            ..Default::default()
        }
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_stack(mut self, stack: StackOffset) -> Self {
        self.stack = Some(stack);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn field_name(&self) -> Option<&str> {
        self.field.as_ref().and_then(FieldRef::as_name)
    }
}

pub type Encoding = BTreeMap<Channel, ChannelDef>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    Single,
    Multi,
    Interval,
}

/// Interactive selection definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(rename = "type")]
    pub selection_type: SelectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Selection {
    pub fn interval() -> Self {
        Self {
            selection_type: SelectionType::Interval,
            bind: None,
            resolve: None,
            on: None,
            translate: None,
            zoom: None,
            extra: Map::new(),
        }
    }

    /// Pan/zoom bound to the scales
    pub fn grid() -> Self {
        Self {
            bind: Some("scales".to_string()),
            ..Self::interval()
        }
    }
}

/// Data payload: inline rows or a named data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Map<String, Value>>>,
}

impl Data {
    pub fn inline(values: Vec<Map<String, Value>>) -> Self {
        Self {
            name: None,
            values: Some(values),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            values: None,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.values.as_ref().map(Vec::len).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repeat {
    pub row: Vec<String>,
    pub column: Vec<String>,
}

/// A Vega-Lite document (unit, repeat or layer spec)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VegaLite {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark: Option<Mark>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub encoding: Encoding,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<BTreeMap<String, Selection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Repeat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Box<VegaLite>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<Vec<VegaLite>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VegaLite {
    /// Empty top-level document tagged with the schema URL
    pub fn new() -> Self {
        Self {
            schema: Some(SCHEMA_URL.to_string()),
            ..Default::default()
        }
    }

    pub fn encode(&mut self, channel: Channel, def: ChannelDef) -> &mut Self {
        self.encoding.insert(channel, def);
        self
    }

    pub fn encoding_mut(&mut self, channel: Channel) -> Option<&mut ChannelDef> {
        self.encoding.get_mut(&channel)
    }

    /// Same document with the data payload removed
    pub fn without_data(&self) -> Self {
        Self {
            data: None,
            ..self.clone()
        }
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
