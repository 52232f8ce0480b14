//! Incremental pretty-printed JSON.
//!
//! Output is byte-for-byte what `serde_json::to_string_pretty` produces for
//! the same tree, but containers are walked and written piecewise so the
//! whole document never exists as one string. For bundles only one entry is
//! converted to a [`Value`] tree at a time.

use std::io::{BufWriter, Write};

use fhir_model::Bundle;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::Result;

/// Written in place of anything that fails to serialize.
pub const UNSERIALIZABLE: &str = "[Unserializable]";

const INDENT: &[u8] = b"  ";

/// Streams JSON documents into a buffered sink.
pub struct StreamingJsonWriter<W: Write> {
    writer: BufWriter<W>,
    bytes_written: u64,
}

impl<W: Write> StreamingJsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            bytes_written: 0,
        }
    }

    /// Bytes handed to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Writes a complete value tree as a document.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        self.write_node(value, 0)
    }

    /// Serializes `item` to a value tree and writes it; failures become the
    /// placeholder string.
    pub fn write_serialize<T: Serialize + ?Sized>(&mut self, item: &T) -> Result<()> {
        let value = to_tree(item);
        self.write_node(&value, 0)
    }

    /// Writes a top-level array, converting one item at a time.
    pub fn write_array<T, I>(&mut self, items: I) -> Result<()>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return self.raw(b"[]");
        }
        self.raw(b"[")?;
        for (index, item) in items.enumerate() {
            self.member_prefix(index, 1)?;
            self.write_node(&to_tree(&item), 1)?;
        }
        self.close(b']', 0)
    }

    /// Writes a transaction bundle entry by entry.
    pub fn write_bundle(&mut self, bundle: &Bundle) -> Result<()> {
        self.raw(b"{")?;
        self.member_prefix(0, 1)?;
        self.key("resourceType")?;
        self.write_leaf(&Value::String(bundle.resource_type.clone()))?;
        self.member_prefix(1, 1)?;
        self.key("type")?;
        self.write_node(&to_tree(&bundle.bundle_type), 1)?;
        self.member_prefix(2, 1)?;
        self.key("entry")?;
        if bundle.entry.is_empty() {
            self.raw(b"[]")?;
        } else {
            self.raw(b"[")?;
            for (index, entry) in bundle.entry.iter().enumerate() {
                self.member_prefix(index, 2)?;
                self.write_node(&to_tree(entry), 2)?;
            }
            self.close(b']', 1)?;
        }
        self.close(b'}', 0)
    }

    /// Flushes buffered output and returns the sink.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|err| err.into_error().into())
    }

    fn write_node(&mut self, value: &Value, depth: usize) -> Result<()> {
        match value {
            Value::Array(items) if !items.is_empty() => {
                self.raw(b"[")?;
                for (index, item) in items.iter().enumerate() {
                    self.member_prefix(index, depth + 1)?;
                    self.write_node(item, depth + 1)?;
                }
                self.close(b']', depth)
            }
            Value::Object(members) if !members.is_empty() => {
                self.raw(b"{")?;
                for (index, (name, member)) in members.iter().enumerate() {
                    self.member_prefix(index, depth + 1)?;
                    self.key(name)?;
                    self.write_node(member, depth + 1)?;
                }
                self.close(b'}', depth)
            }
            leaf => self.write_leaf(leaf),
        }
    }

    fn write_leaf(&mut self, leaf: &Value) -> Result<()> {
        match serde_json::to_vec(leaf) {
            Ok(bytes) => self.raw(&bytes),
            Err(err) => {
                warn!(error = %err, "leaf value could not be serialized");
                self.placeholder()
            }
        }
    }

    fn key(&mut self, name: &str) -> Result<()> {
        match serde_json::to_vec(name) {
            Ok(bytes) => self.raw(&bytes)?,
            Err(_) => self.placeholder()?,
        }
        self.raw(b": ")
    }

    fn placeholder(&mut self) -> Result<()> {
        self.raw(b"\"")?;
        self.raw(UNSERIALIZABLE.as_bytes())?;
        self.raw(b"\"")
    }

    /// Separator before a container member: comma for all but the first,
    /// then newline and indentation.
    fn member_prefix(&mut self, index: usize, depth: usize) -> Result<()> {
        if index > 0 {
            self.raw(b",")?;
        }
        self.newline(depth)
    }

    fn close(&mut self, bracket: u8, depth: usize) -> Result<()> {
        self.newline(depth)?;
        self.raw(&[bracket])
    }

    fn newline(&mut self, depth: usize) -> Result<()> {
        self.raw(b"\n")?;
        for _ in 0..depth {
            self.raw(INDENT)?;
        }
        Ok(())
    }

    fn raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}

/// Converts a serializable item to a value tree, substituting the
/// placeholder on failure.
fn to_tree<T: Serialize + ?Sized>(item: &T) -> Value {
    serde_json::to_value(item).unwrap_or_else(|err| {
        warn!(error = %err, "item could not be serialized; writing placeholder");
        Value::String(UNSERIALIZABLE.to_string())
    })
}
