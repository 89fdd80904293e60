//! Symbol discovery inside value expressions

use crate::ast::Expr;

use super::Walk;

impl Walk<'_> {
    /// Reports every symbol a value expression refers to.
    ///
    /// Function literal bodies are not inspected, so a symbol named only
    /// inside one is not discovered.
    pub(crate) fn walk_value(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => {
                self.reach(ident);
            }
            Expr::CompositeLit { ty, elts, .. } => {
                if let Some(ty) = ty {
                    self.walk_type(ty);
                }
                for elt in elts {
                    self.walk_value(elt);
                }
            }
            Expr::Call { fun, args, .. } => {
                self.walk_operand(fun);
                for arg in args {
                    self.walk_operand(arg);
                }
            }
            Expr::Unary { operand, .. } | Expr::Star { operand, .. } => self.walk_value(operand),
            Expr::Binary { left, right, .. } => {
                self.walk_value(left);
                self.walk_value(right);
            }
            Expr::Paren { inner, .. } => self.walk_value(inner),
            Expr::KeyValue { key, value, .. } => {
                self.walk_value(key);
                self.walk_value(value);
            }
            // The member is captured by resolution when it matters.
            Expr::Selector { base, .. } => self.walk_value(base),
            Expr::Index { base, index, .. } => {
                self.walk_value(base);
                self.walk_operand(index);
            }
            Expr::Slice {
                base,
                low,
                high,
                max,
                ..
            } => {
                self.walk_value(base);
                for bound in [low, high, max].into_iter().flatten() {
                    self.walk_value(bound);
                }
            }
            Expr::TypeAssert { operand, .. } => self.walk_value(operand),
            Expr::Generic { .. } => self.walk_type(expr),
            Expr::FuncLit { .. } | Expr::BasicLit { .. } | Expr::Bad { .. } => {}
            _ => {}
        }
    }

    /// Callees and call arguments may be types: `[]byte(s)`, `make([]T, n)`.
    fn walk_operand(&mut self, expr: &Expr) {
        if is_type_expr(expr) {
            self.walk_type(expr);
        } else {
            self.walk_value(expr);
        }
    }
}

fn is_type_expr(expr: &Expr) -> bool {
    match expr {
        Expr::ArrayType { .. }
        | Expr::MapType { .. }
        | Expr::ChanType { .. }
        | Expr::FuncType(_)
        | Expr::StructType { .. }
        | Expr::InterfaceType { .. } => true,
        Expr::Paren { inner, .. } => is_type_expr(inner),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::FileId;
    use crate::closure::ClosureBuilder;
    use crate::loader::Package;
    use crate::parser::ParsedFile;

    /// Like the type walker tests, with `var Probe = <value>` declared
    /// outside the entry file.
    fn used_by_value(value: &str) -> Vec<String> {
        let entry = "package p\n\nvar _ = Probe\n";
        let decls = format!(
            r#"package p

var Probe = {value}

type T struct{{ X int }}

type U int

var (
	a = 1
	b = 2
	c = 3
	d = []int{{1, 2, 3}}
	ch = make(chan T, 1)
)

func f(args ...int) int {{ return len(args) }}

func g() int {{ return c }}

func hidden() int {{ return 0 }}
"#
        );
        let package = Package {
            name: "p".to_string(),
            dir: ".".into(),
            files: vec![
                ParsedFile::from_source(FileId(0), "main.go", entry),
                ParsedFile::from_source(FileId(1), "decls.go", &decls),
            ],
            entry: FileId(0),
        };
        let model = package.resolve();
        let closure = ClosureBuilder::new(&package, &model).build();
        closure
            .used
            .into_iter()
            .filter(|name| name != "Probe")
            .collect()
    }

    #[test]
    fn identifiers_and_operators() {
        assert_eq!(used_by_value("a"), vec!["a"]);
        assert_eq!(used_by_value("-a + b*(c)"), vec!["a", "b", "c"]);
    }

    #[test]
    fn calls_walk_callee_and_arguments() {
        assert_eq!(used_by_value("f(a, b)"), vec!["a", "b", "f"]);
        assert_eq!(used_by_value("g()"), vec!["c", "g"]);
    }

    #[test]
    fn type_arguments_and_conversions() {
        assert_eq!(used_by_value("make([]T, a)"), vec!["T", "a"]);
        assert_eq!(used_by_value("[]U(nil)"), vec!["U"]);
        assert_eq!(used_by_value("U(a)"), vec!["U", "a"]);
    }

    #[test]
    fn composite_literals() {
        assert_eq!(used_by_value("T{X: a}"), vec!["T", "a"]);
        assert_eq!(used_by_value("&T{}"), vec!["T"]);
        assert_eq!(used_by_value("map[string]U{\"k\": U(b)}"), vec!["U", "b"]);
    }

    #[test]
    fn index_slice_and_selector() {
        assert_eq!(used_by_value("d[a:b]"), vec!["a", "b", "d"]);
        assert_eq!(used_by_value("d[c]"), vec!["c", "d"]);
        assert_eq!(used_by_value("T{}.X"), vec!["T"]);
    }

    #[test]
    fn three_index_slices_walk_every_bound() {
        assert_eq!(used_by_value("d[a:b:c]"), vec!["a", "b", "c", "d"]);
        assert_eq!(used_by_value("d[:b:c]"), vec!["b", "c", "d"]);
    }

    #[test]
    fn type_assertions_walk_only_the_operand() {
        assert_eq!(used_by_value("any(T{}).(U)"), vec!["T"]);
        assert_eq!(used_by_value("any(a).(interface{ M() U })"), vec!["a"]);
    }

    #[test]
    fn map_literal_keys_are_values() {
        assert_eq!(used_by_value("map[U]int{a: 1, b: 2}"), vec!["U", "a", "b"]);
    }

    #[test]
    fn channel_operators() {
        assert_eq!(used_by_value("<-ch"), vec!["T", "ch"]);
        assert_eq!(used_by_value("^a &^ b"), vec!["a", "b"]);
    }

    #[test]
    fn function_literal_bodies_are_not_inspected() {
        assert_eq!(used_by_value("func() int { return hidden() }"), Vec::<String>::new());
        assert_eq!(used_by_value("func() int { return hidden() }()"), Vec::<String>::new());
    }

    #[test]
    fn literals_stop_recursion() {
        assert_eq!(used_by_value("\"text\""), Vec::<String>::new());
        assert_eq!(used_by_value("42"), Vec::<String>::new());
    }
}
