// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Visitor protocol shared by messages and codecs.
//!
//! A message replays itself as `pre_visit`, one `visit` per field in
//! declaration order, then `post_visit`. Scalar fields arrive as a
//! [`FieldMut`] so the same walk serves encoders (which read the value) and
//! decoders (which overwrite it). Nested messages go through
//! [`Visitor::visit_message`] and are walked recursively.
//!
//! # Example
//!
//! ```rust
//! use cluon::{FieldInfo, FieldMut, Visitable, Visitor};
//!
//! #[derive(Default)]
//! struct Reading {
//!     value: f32,
//! }
//!
//! impl Visitable for Reading {
//!     fn accept<V: Visitor>(&mut self, visitor: &mut V) {
//!         visitor.pre_visit(7, "Reading", "demo.Reading");
//!         visitor.visit(FieldInfo::new(1, "float", "value"), FieldMut::Float(&mut self.value));
//!         visitor.post_visit();
//!     }
//! }
//!
//! let mut names = Vec::new();
//! Reading::default().accept_with(|_, _, _| {}, |f, _| names.push(f.name.to_string()), || {});
//! assert_eq!(names, vec!["value"]);
//! ```

use crate::schema::DataType;

/// Identity of a visited field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo<'a> {
    /// Numerical field identifier.
    pub id: u32,
    /// Type label (`uint8`, `string`, or a message name).
    pub type_name: &'a str,
    pub name: &'a str,
}

impl<'a> FieldInfo<'a> {
    pub fn new(id: u32, type_name: &'a str, name: &'a str) -> Self {
        Self {
            id,
            type_name,
            name,
        }
    }
}

/// Mutable access to one scalar field.
#[derive(Debug)]
pub enum FieldMut<'a> {
    Bool(&'a mut bool),
    Char(&'a mut char),
    Int8(&'a mut i8),
    Uint8(&'a mut u8),
    Int16(&'a mut i16),
    Uint16(&'a mut u16),
    Int32(&'a mut i32),
    Uint32(&'a mut u32),
    Int64(&'a mut i64),
    Uint64(&'a mut u64),
    Float(&'a mut f32),
    Double(&'a mut f64),
    String(&'a mut String),
    Bytes(&'a mut Vec<u8>),
}

impl FieldMut<'_> {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Bool(_) => DataType::Bool,
            Self::Char(_) => DataType::Char,
            Self::Int8(_) => DataType::Int8,
            Self::Uint8(_) => DataType::Uint8,
            Self::Int16(_) => DataType::Int16,
            Self::Uint16(_) => DataType::Uint16,
            Self::Int32(_) => DataType::Int32,
            Self::Uint32(_) => DataType::Uint32,
            Self::Int64(_) => DataType::Int64,
            Self::Uint64(_) => DataType::Uint64,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
            Self::Bytes(_) => DataType::Bytes,
        }
    }

    /// Check if the field holds its type's zero value.
    pub fn is_default(&self) -> bool {
        match self {
            Self::Bool(v) => !**v,
            Self::Char(v) => **v == '\0',
            Self::Int8(v) => **v == 0,
            Self::Uint8(v) => **v == 0,
            Self::Int16(v) => **v == 0,
            Self::Uint16(v) => **v == 0,
            Self::Int32(v) => **v == 0,
            Self::Uint32(v) => **v == 0,
            Self::Int64(v) => **v == 0,
            Self::Uint64(v) => **v == 0,
            Self::Float(v) => **v == 0.0,
            Self::Double(v) => **v == 0.0,
            Self::String(v) => v.is_empty(),
            Self::Bytes(v) => v.is_empty(),
        }
    }
}

/// Receives the fields of a [`Visitable`] value.
pub trait Visitor {
    /// Called once before any field.
    fn pre_visit(&mut self, id: i32, short_name: &str, long_name: &str) {
        let _ = (id, short_name, long_name);
    }

    /// Called once per scalar field.
    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>);

    /// Called for nested message fields.
    ///
    /// The default walks the nested message with this same visitor, so its
    /// own `pre_visit`/`post_visit` pair is nested inside the outer one.
    fn visit_message<M: Visitable>(&mut self, field: FieldInfo<'_>, value: &mut M)
    where
        Self: Sized,
    {
        let _ = field;
        value.accept(self);
    }

    /// Called once after all fields.
    fn post_visit(&mut self) {}
}

/// A value that can replay its fields to a [`Visitor`].
pub trait Visitable {
    fn accept<V: Visitor>(&mut self, visitor: &mut V);

    /// Visit with three closures instead of a visitor type.
    ///
    /// Nested messages are walked recursively with the same closures.
    fn accept_with<P, F, Q>(&mut self, pre_visit: P, visit: F, post_visit: Q)
    where
        P: FnMut(i32, &str, &str),
        F: FnMut(FieldInfo<'_>, FieldMut<'_>),
        Q: FnMut(),
    {
        let mut visitor = ClosureVisitor {
            pre_visit,
            visit,
            post_visit,
        };
        self.accept(&mut visitor);
    }
}

/// Static identity of a message type.
pub trait Message: Visitable + Default {
    /// Numerical message identifier.
    const ID: i32;
    /// Last segment of the message name.
    const SHORT_NAME: &'static str;
    /// Fully-qualified message name.
    const LONG_NAME: &'static str;
}

/// Deepest message nesting a decoder descends into.
///
/// Levels below the limit are left unset and reported by the decoder.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A decode-direction visitor that is primed from a byte buffer.
///
/// Nested messages are decoded by priming a fresh decoder with the field's
/// own bytes.
pub trait Decoder: Visitor + Default {
    fn decode_from(&mut self, data: &[u8]);

    /// Fold what a nested decoder recorded into this one.
    fn absorb(&mut self, nested: &Self) {
        let _ = nested;
    }

    /// The nested message in `field` was skipped at [`MAX_NESTING_DEPTH`].
    fn nesting_limit_reached(&mut self, field: FieldInfo<'_>) {
        let _ = field;
    }
}

struct ClosureVisitor<P, F, Q> {
    pre_visit: P,
    visit: F,
    post_visit: Q,
}

impl<P, F, Q> Visitor for ClosureVisitor<P, F, Q>
where
    P: FnMut(i32, &str, &str),
    F: FnMut(FieldInfo<'_>, FieldMut<'_>),
    Q: FnMut(),
{
    fn pre_visit(&mut self, id: i32, short_name: &str, long_name: &str) {
        (self.pre_visit)(id, short_name, long_name);
    }

    fn visit(&mut self, field: FieldInfo<'_>, value: FieldMut<'_>) {
        (self.visit)(field, value);
    }

    fn post_visit(&mut self) {
        (self.post_visit)();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Inner {
        flag: bool,
    }

    impl Visitable for Inner {
        fn accept<V: Visitor>(&mut self, visitor: &mut V) {
            visitor.pre_visit(2, "Inner", "t.Inner");
            visitor.visit(FieldInfo::new(1, "bool", "flag"), FieldMut::Bool(&mut self.flag));
            visitor.post_visit();
        }
    }

    #[derive(Default)]
    struct Outer {
        count: u16,
        inner: Inner,
        label: String,
    }

    impl Visitable for Outer {
        fn accept<V: Visitor>(&mut self, visitor: &mut V) {
            visitor.pre_visit(1, "Outer", "t.Outer");
            visitor.visit(FieldInfo::new(1, "uint16", "count"), FieldMut::Uint16(&mut self.count));
            visitor.visit_message(FieldInfo::new(2, "t.Inner", "inner"), &mut self.inner);
            visitor.visit(FieldInfo::new(3, "string", "label"), FieldMut::String(&mut self.label));
            visitor.post_visit();
        }
    }

    #[test]
    fn test_closure_visitor_order() {
        use std::cell::RefCell;

        let events = RefCell::new(Vec::new());
        let mut outer = Outer::default();
        outer.accept_with(
            |id, short, _| events.borrow_mut().push(format!("pre {id} {short}")),
            |f, _| events.borrow_mut().push(format!("visit {} {}", f.id, f.name)),
            || events.borrow_mut().push("post".to_string()),
        );

        assert_eq!(
            events.into_inner(),
            vec![
                "pre 1 Outer",
                "visit 1 count",
                "pre 2 Inner",
                "visit 1 flag",
                "post",
                "visit 3 label",
                "post"
            ]
        );
    }

    #[test]
    fn test_closure_visitor_can_write() {
        let mut outer = Outer::default();
        outer.accept_with(
            |_, _, _| {},
            |_, value| match value {
                FieldMut::Uint16(v) => *v = 9,
                FieldMut::Bool(v) => *v = true,
                FieldMut::String(v) => v.push_str("set"),
                _ => {}
            },
            || {},
        );
        assert_eq!(outer.count, 9);
        assert!(outer.inner.flag);
        assert_eq!(outer.label, "set");
    }

    #[test]
    fn test_field_mut_defaults() {
        let mut zero = 0i64;
        let mut one = 1u8;
        let mut empty = String::new();
        let mut c = 'a';
        let mut f = 0.0f32;
        assert!(FieldMut::Int64(&mut zero).is_default());
        assert!(!FieldMut::Uint8(&mut one).is_default());
        assert!(FieldMut::String(&mut empty).is_default());
        assert!(!FieldMut::Char(&mut c).is_default());
        assert!(FieldMut::Float(&mut f).is_default());
        assert_eq!(FieldMut::Char(&mut c).data_type(), DataType::Char);
    }
}
