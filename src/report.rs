/*!
Decode results.

Every decoder fills a [`Report`](struct.Report.html): human-readable text lines, plus a parallel tree of named values for machine consumption. With the `serializable` feature, the tree can be serialized (e.g. as JSON); text lines are not part of the serialized form.
*/

#[cfg(feature = "serializable")]
use serde::ser::{Serialize, Serializer, SerializeMap, SerializeSeq};

use crate::utils::hex_string;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Bool(bool),
	Int(u64),
	Str(String),
	/// Serialized as a lowercase hex string
	Bytes(Vec<u8>),
	Object(Vec<Node>),
	Array(Vec<Value>),
}

impl Value {
	pub fn as_int(&self) -> Option<u64> {
		match *self { Value::Int(i) => Some(i), _ => None }
	}
	pub fn as_bool(&self) -> Option<bool> {
		match *self { Value::Bool(b) => Some(b), _ => None }
	}
	pub fn as_str(&self) -> Option<&str> {
		match *self { Value::Str(ref s) => Some(s), _ => None }
	}
	pub fn as_array(&self) -> Option<&[Value]> {
		match *self { Value::Array(ref a) => Some(a), _ => None }
	}
	/// Looks up `name` in this object (not recursively).
	pub fn get(&self, name: &str) -> Option<&Value> {
		match *self {
			Value::Object(ref nodes) => nodes.iter().find(|n| n.name == name).map(|n| &n.value),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
	pub name: String,
	pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
	pub lines: Vec<String>,
	pub nodes: Vec<Node>,
	/// Non-fatal problems (truncation, malformed records) noticed while decoding
	pub warnings: Vec<String>,
}

impl Report {
	pub fn new() -> Self {
		Default::default()
	}

	/// Adds a text line only.
	pub fn line<S: Into<String>>(&mut self, line: S) {
		self.lines.push(line.into());
	}

	/// Adds a tree node only.
	pub fn node<S: Into<String>>(&mut self, name: S, value: Value) {
		self.nodes.push(Node { name: name.into(), value });
	}

	/// Adds both a text line and a tree node.
	pub fn field<S: Into<String>>(&mut self, line: S, name: &str, value: Value) {
		self.line(line);
		self.node(name, value);
	}

	/**
	Adds one text line of `LABEL=value` pairs (separated by two spaces and prefixed by `indent`), and an integer node for every pair.
	*/
	pub fn flags(&mut self, indent: &str, fields: &[(&str, &str, u64)]) {
		let mut line = String::from(indent);
		for (i, &(label, name, value)) in fields.iter().enumerate() {
			if i > 0 { line.push_str("  "); }
			line.push_str(&format!("{}={}", label, value));
			self.node(name, Value::Int(value));
		}
		self.line(line);
	}

	pub fn warn<S: Into<String>>(&mut self, msg: S) {
		let msg = msg.into();
		warn!("{}", msg);
		self.warnings.push(msg);
	}

	/// Appends text lines and warnings of `other`, and nests its nodes as an object named `name`.
	pub fn nest(&mut self, name: &str, other: Report) {
		self.lines.extend(other.lines);
		self.warnings.extend(other.warnings);
		self.node(name, Value::Object(other.nodes));
	}

	/// Same as [`nest`](#method.nest), but pushes `other` into the array named `array` (which is created on first use).
	pub fn push(&mut self, array: &str, other: Report) {
		self.lines.extend(other.lines);
		self.warnings.extend(other.warnings);
		let item = Value::Object(other.nodes);

		if let Some(node) = self.nodes.iter_mut().find(|n| n.name == array) {
			if let Value::Array(ref mut items) = node.value {
				items.push(item);
				return;
			}
		}
		self.node(array, Value::Array(vec![item]));
	}

	/// Top-level node by name.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.nodes.iter().find(|n| n.name == name).map(|n| &n.value)
	}

	/// First node named `name` in depth-first order.
	pub fn find(&self, name: &str) -> Option<&Value> {
		find_in(&self.nodes, name)
	}

	pub fn text(&self) -> String {
		let mut s = self.lines.join("\n");
		if !s.is_empty() { s.push('\n'); }
		s
	}
}

fn find_in<'a>(nodes: &'a [Node], name: &str) -> Option<&'a Value> {
	for node in nodes {
		if node.name == name {
			return Some(&node.value);
		}
		if let Some(v) = find_value(&node.value, name) {
			return Some(v);
		}
	}
	None
}

fn find_value<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
	match *value {
		Value::Object(ref nodes) => find_in(nodes, name),
		Value::Array(ref items) => items.iter().filter_map(|v| find_value(v, name)).next(),
		_ => None,
	}
}

#[cfg(feature = "serializable")]
impl Serialize for Value {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match *self {
			Value::Bool(b) => serializer.serialize_bool(b),
			Value::Int(i) => serializer.serialize_u64(i),
			Value::Str(ref s) => serializer.serialize_str(s),
			Value::Bytes(ref b) => serializer.serialize_str(&hex_string(b)),
			Value::Object(ref nodes) => serialize_nodes(nodes, serializer),
			Value::Array(ref items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			},
		}
	}
}

#[cfg(feature = "serializable")]
impl Serialize for Report {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serialize_nodes(&self.nodes, serializer)
	}
}

#[cfg(feature = "serializable")]
fn serialize_nodes<S: Serializer>(nodes: &[Node], serializer: S) -> Result<S::Ok, S::Error> {
	let mut map = serializer.serialize_map(Some(nodes.len()))?;
	for node in nodes {
		map.serialize_entry(&node.name, &node.value)?;
	}
	map.end()
}

impl ::std::fmt::Display for Value {
	fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
		match *self {
			Value::Bool(b) => write!(f, "{}", if b { 1 } else { 0 }),
			Value::Int(i) => write!(f, "{}", i),
			Value::Str(ref s) => write!(f, "{}", s),
			Value::Bytes(ref b) => write!(f, "0x{}", hex_string(b)),
			Value::Object(ref nodes) => {
				write!(f, "{{")?;
				for (i, n) in nodes.iter().enumerate() {
					if i > 0 { write!(f, ", ")?; }
					write!(f, "{}: {}", n.name, n.value)?;
				}
				write!(f, "}}")
			},
			Value::Array(ref items) => {
				write!(f, "[")?;
				for (i, v) in items.iter().enumerate() {
					if i > 0 { write!(f, ", ")?; }
					write!(f, "{}", v)?;
				}
				write!(f, "]")
			},
		}
	}
}
