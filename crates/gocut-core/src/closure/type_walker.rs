//! Symbol discovery inside type expressions

use crate::ast::{Expr, FieldList, FuncType};

use super::Walk;

impl Walk<'_> {
    /// Reports every symbol a type expression names.
    ///
    /// Interface bodies are not entered: method signatures inside an
    /// interface contribute no edges.
    pub(crate) fn walk_type(&mut self, ty: &Expr) {
        match ty {
            Expr::Ident(ident) => {
                self.reach(ident);
            }
            Expr::Star { operand, .. } | Expr::Unary { operand, .. } => self.walk_type(operand),
            Expr::Paren { inner, .. } => self.walk_type(inner),
            Expr::ArrayType { len, elem, .. } => {
                if let Some(len) = len {
                    self.walk_value(len);
                }
                self.walk_type(elem);
            }
            Expr::MapType { key, value, .. } => {
                self.walk_type(key);
                self.walk_type(value);
            }
            // The member of `pkg.Type` is foreign; only the qualifier is ours.
            Expr::Selector { base, .. } => self.walk_type(base),
            Expr::FuncType(func_type) => self.walk_signature(func_type),
            Expr::ChanType { value, .. } => self.walk_type(value),
            Expr::Ellipsis { elem, .. } => {
                if let Some(elem) = elem {
                    self.walk_type(elem);
                }
            }
            Expr::Generic { base, args, .. } => {
                self.walk_type(base);
                for arg in args {
                    self.walk_type(arg);
                }
            }
            Expr::Index { base, index, .. } => {
                self.walk_type(base);
                self.walk_type(index);
            }
            Expr::StructType { fields, .. } => self.walk_fields(fields),
            Expr::InterfaceType { .. } => {}
            _ => {}
        }
    }

    fn walk_signature(&mut self, func_type: &FuncType) {
        self.walk_fields(&func_type.params);
        if let Some(results) = &func_type.results {
            self.walk_fields(results);
        }
    }

    fn walk_fields(&mut self, fields: &FieldList) {
        for field in &fields.fields {
            self.walk_type(&field.ty);
        }
    }
}
