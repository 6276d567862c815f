//! The little-endian mutation opcode stream (spec §4.9) — the sole wire format
//! crossing the runtime/interpreter boundary.
//!
//! `MutationWriter` encodes into a caller-owned, fixed-capacity byte slice (no
//! growable `Vec` here: spec §7 puts writer overflow in the fatal/backpressure
//! bucket, so callers are expected to size their buffer and handle the refusal,
//! the same contract `dioxus-core`'s `WriteMutations` trait methods document even
//! though the teacher's own implementation backs onto a growable `Vec<Mutation>`).
//! `MutationReader` is the exact inverse, decoding one opcode at a time.

use crate::error::{Result, RuntimeError};
use smallvec::SmallVec;

pub const OP_END: u8 = 0x00;
pub const OP_APPEND_CHILDREN: u8 = 0x01;
pub const OP_ASSIGN_ID: u8 = 0x02;
pub const OP_CREATE_PLACEHOLDER: u8 = 0x03;
pub const OP_CREATE_TEXT_NODE: u8 = 0x04;
pub const OP_LOAD_TEMPLATE: u8 = 0x05;
pub const OP_REPLACE_WITH: u8 = 0x06;
pub const OP_REPLACE_PLACEHOLDER: u8 = 0x07;
pub const OP_INSERT_AFTER: u8 = 0x08;
pub const OP_INSERT_BEFORE: u8 = 0x09;
pub const OP_SET_ATTRIBUTE: u8 = 0x0A;
pub const OP_SET_TEXT: u8 = 0x0B;
pub const OP_NEW_EVENT_LISTENER: u8 = 0x0C;
pub const OP_REMOVE_EVENT_LISTENER: u8 = 0x0D;
pub const OP_REMOVE: u8 = 0x0E;
pub const OP_PUSH_ROOT: u8 = 0x0F;

/// Child-index path, stack-allocated for the common shallow-template case.
pub type Path = SmallVec<[u8; 8]>;

/// A single decoded mutation. Produced by [`MutationReader`], consumed by the
/// interpreter's `DomSink` drivers.
#[derive(Clone, Debug, PartialEq)]
pub enum Opcode {
    End,
    AppendChildren { id: u32, m: u32 },
    AssignId { path: Path, id: u32 },
    CreatePlaceholder { id: u32 },
    CreateTextNode { id: u32, text: String },
    LoadTemplate { tmpl_id: u32, root_index: u32, id: u32 },
    ReplaceWith { id: u32, m: u32 },
    ReplacePlaceholder { path: Path, m: u32 },
    InsertAfter { id: u32, m: u32 },
    InsertBefore { id: u32, m: u32 },
    SetAttribute { id: u32, ns: u8, name: String, value: String },
    SetText { id: u32, text: String },
    NewEventListener { id: u32, name: String },
    RemoveEventListener { id: u32, name: String },
    Remove { id: u32 },
    PushRoot { id: u32 },
}

/// Encodes mutations into a caller-owned buffer up to a fixed capacity.
pub struct MutationWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    dirty_scopes: SmallVec<[u32; 4]>,
}

impl<'a> MutationWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            dirty_scopes: SmallVec::new(),
        }
    }

    /// Records which scope produced the mutations about to be written, for test
    /// introspection only — not part of the wire format. Mirrors
    /// `MutationsVec::dirty_scopes` on the writer rather than the reader side,
    /// since by the time a buffer is decoded the scope that caused a given
    /// mutation is no longer recoverable from the opcode stream itself.
    pub fn mark_scope_dirty(&mut self, scope: u32) {
        self.dirty_scopes.push(scope);
    }

    pub fn dirty_scopes(&self) -> &[u32] {
        &self.dirty_scopes
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn reserve(&mut self, needed: usize) -> Result<()> {
        if needed > self.remaining() {
            return Err(RuntimeError::WriterOverflow {
                needed,
                capacity: self.remaining(),
            });
        }
        Ok(())
    }

    fn put_u8(&mut self, v: u8) {
        self.buf[self.pos] = v;
        self.pos += 1;
    }

    fn put_u16(&mut self, v: u16) {
        self.buf[self.pos..self.pos + 2].copy_from_slice(&v.to_le_bytes());
        self.pos += 2;
    }

    fn put_u32(&mut self, v: u32) {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&v.to_le_bytes());
        self.pos += 4;
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn op(&mut self, tag: u8, needed_after_tag: usize) -> Result<()> {
        self.reserve(1 + needed_after_tag)?;
        self.put_u8(tag);
        Ok(())
    }

    pub fn append_children(&mut self, id: u32, m: u32) -> Result<()> {
        self.op(OP_APPEND_CHILDREN, 8)?;
        self.put_u32(id);
        self.put_u32(m);
        Ok(())
    }

    pub fn assign_id(&mut self, path: &[u8], id: u32) -> Result<()> {
        if path.len() > u8::MAX as usize {
            return Err(RuntimeError::PathTooDeep);
        }
        self.op(OP_ASSIGN_ID, 1 + path.len() + 4)?;
        self.put_u8(path.len() as u8);
        self.put_bytes(path);
        self.put_u32(id);
        Ok(())
    }

    pub fn create_placeholder(&mut self, id: u32) -> Result<()> {
        self.op(OP_CREATE_PLACEHOLDER, 4)?;
        self.put_u32(id);
        Ok(())
    }

    pub fn create_text_node(&mut self, id: u32, text: &str) -> Result<()> {
        let bytes = text.as_bytes();
        self.op(OP_CREATE_TEXT_NODE, 4 + 4 + bytes.len())?;
        self.put_u32(id);
        self.put_u32(bytes.len() as u32);
        self.put_bytes(bytes);
        Ok(())
    }

    pub fn load_template(&mut self, tmpl_id: u32, root_index: u32, id: u32) -> Result<()> {
        self.op(OP_LOAD_TEMPLATE, 12)?;
        self.put_u32(tmpl_id);
        self.put_u32(root_index);
        self.put_u32(id);
        Ok(())
    }

    pub fn replace_with(&mut self, id: u32, m: u32) -> Result<()> {
        self.op(OP_REPLACE_WITH, 8)?;
        self.put_u32(id);
        self.put_u32(m);
        Ok(())
    }

    pub fn replace_placeholder(&mut self, path: &[u8], m: u32) -> Result<()> {
        if path.len() > u8::MAX as usize {
            return Err(RuntimeError::PathTooDeep);
        }
        self.op(OP_REPLACE_PLACEHOLDER, 1 + path.len() + 4)?;
        self.put_u8(path.len() as u8);
        self.put_bytes(path);
        self.put_u32(m);
        Ok(())
    }

    pub fn insert_after(&mut self, id: u32, m: u32) -> Result<()> {
        self.op(OP_INSERT_AFTER, 8)?;
        self.put_u32(id);
        self.put_u32(m);
        Ok(())
    }

    pub fn insert_before(&mut self, id: u32, m: u32) -> Result<()> {
        self.op(OP_INSERT_BEFORE, 8)?;
        self.put_u32(id);
        self.put_u32(m);
        Ok(())
    }

    pub fn set_attribute(&mut self, id: u32, ns: u8, name: &str, value: &str) -> Result<()> {
        let name_bytes = name.as_bytes();
        let value_bytes = value.as_bytes();
        self.op(
            OP_SET_ATTRIBUTE,
            4 + 1 + 2 + name_bytes.len() + 4 + value_bytes.len(),
        )?;
        self.put_u32(id);
        self.put_u8(ns);
        self.put_u16(name_bytes.len() as u16);
        self.put_bytes(name_bytes);
        self.put_u32(value_bytes.len() as u32);
        self.put_bytes(value_bytes);
        Ok(())
    }

    pub fn set_text(&mut self, id: u32, text: &str) -> Result<()> {
        let bytes = text.as_bytes();
        self.op(OP_SET_TEXT, 4 + 4 + bytes.len())?;
        self.put_u32(id);
        self.put_u32(bytes.len() as u32);
        self.put_bytes(bytes);
        Ok(())
    }

    pub fn new_event_listener(&mut self, id: u32, name: &str) -> Result<()> {
        let bytes = name.as_bytes();
        self.op(OP_NEW_EVENT_LISTENER, 4 + 2 + bytes.len())?;
        self.put_u32(id);
        self.put_u16(bytes.len() as u16);
        self.put_bytes(bytes);
        Ok(())
    }

    pub fn remove_event_listener(&mut self, id: u32, name: &str) -> Result<()> {
        let bytes = name.as_bytes();
        self.op(OP_REMOVE_EVENT_LISTENER, 4 + 2 + bytes.len())?;
        self.put_u32(id);
        self.put_u16(bytes.len() as u16);
        self.put_bytes(bytes);
        Ok(())
    }

    pub fn remove(&mut self, id: u32) -> Result<()> {
        self.op(OP_REMOVE, 4)?;
        self.put_u32(id);
        Ok(())
    }

    pub fn push_root(&mut self, id: u32) -> Result<()> {
        self.op(OP_PUSH_ROOT, 4)?;
        self.put_u32(id);
        Ok(())
    }

    /// Writes the `End` sentinel and returns the total bytes written. Takes
    /// `&mut self` rather than consuming the writer so a caller can still read
    /// back `dirty_scopes()` afterward for test assertions.
    pub fn finalize(&mut self) -> Result<usize> {
        self.reserve(1)?;
        self.put_u8(OP_END);
        Ok(self.pos)
    }
}

/// Decodes a byte buffer one opcode at a time.
pub struct MutationReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> MutationReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(RuntimeError::BufferTruncated);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn string(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| RuntimeError::BufferTruncated)
    }

    fn path(&mut self) -> Result<Path> {
        let len = self.u8()? as usize;
        Ok(self.take(len)?.iter().copied().collect())
    }

    /// Reads the next opcode, returning `Ok(None)` once `End` has been consumed.
    pub fn next(&mut self) -> Result<Option<Opcode>> {
        let tag = self.u8()?;
        let op = match tag {
            OP_END => return Ok(None),
            OP_APPEND_CHILDREN => Opcode::AppendChildren {
                id: self.u32()?,
                m: self.u32()?,
            },
            OP_ASSIGN_ID => {
                let path = self.path()?;
                Opcode::AssignId { path, id: self.u32()? }
            }
            OP_CREATE_PLACEHOLDER => Opcode::CreatePlaceholder { id: self.u32()? },
            OP_CREATE_TEXT_NODE => {
                let id = self.u32()?;
                let len = self.u32()? as usize;
                Opcode::CreateTextNode {
                    id,
                    text: self.string(len)?,
                }
            }
            OP_LOAD_TEMPLATE => Opcode::LoadTemplate {
                tmpl_id: self.u32()?,
                root_index: self.u32()?,
                id: self.u32()?,
            },
            OP_REPLACE_WITH => Opcode::ReplaceWith {
                id: self.u32()?,
                m: self.u32()?,
            },
            OP_REPLACE_PLACEHOLDER => {
                let path = self.path()?;
                Opcode::ReplacePlaceholder { path, m: self.u32()? }
            }
            OP_INSERT_AFTER => Opcode::InsertAfter {
                id: self.u32()?,
                m: self.u32()?,
            },
            OP_INSERT_BEFORE => Opcode::InsertBefore {
                id: self.u32()?,
                m: self.u32()?,
            },
            OP_SET_ATTRIBUTE => {
                let id = self.u32()?;
                let ns = self.u8()?;
                let name_len = self.u16()? as usize;
                let name = self.string(name_len)?;
                let value_len = self.u32()? as usize;
                let value = self.string(value_len)?;
                Opcode::SetAttribute { id, ns, name, value }
            }
            OP_SET_TEXT => {
                let id = self.u32()?;
                let len = self.u32()? as usize;
                Opcode::SetText {
                    id,
                    text: self.string(len)?,
                }
            }
            OP_NEW_EVENT_LISTENER => {
                let id = self.u32()?;
                let len = self.u16()? as usize;
                Opcode::NewEventListener {
                    id,
                    name: self.string(len)?,
                }
            }
            OP_REMOVE_EVENT_LISTENER => {
                let id = self.u32()?;
                let len = self.u16()? as usize;
                Opcode::RemoveEventListener {
                    id,
                    name: self.string(len)?,
                }
            }
            OP_REMOVE => Opcode::Remove { id: self.u32()? },
            OP_PUSH_ROOT => Opcode::PushRoot { id: self.u32()? },
            other => return Err(RuntimeError::UnknownOpcode(other)),
        };
        Ok(Some(op))
    }
}

impl<'a> Iterator for MutationReader<'a> {
    type Item = Result<Opcode>;

    fn next(&mut self) -> Option<Self::Item> {
        match MutationReader::next(self) {
            Ok(Some(op)) => Some(Ok(op)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
