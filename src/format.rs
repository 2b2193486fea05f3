use crate::ast::{Definition, Expr, ExprKind, Program};

/// Canonical decimal form: `42`, `0.5`, and `-0` printed as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

/// Strings have no escapes, so pick whichever quote the body doesn't contain.
pub fn format_string_literal(s: &str) -> String {
    if s.contains('"') {
        format!("'{}'", s)
    } else {
        format!("\"{}\"", s)
    }
}

pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(expr, &mut out);
    out
}

fn write_expr(expr: &Expr, out: &mut String) {
    match &expr.kind {
        ExprKind::Number(n) => out.push_str(&format_number(*n)),
        ExprKind::String(s) => out.push_str(&format_string_literal(s)),
        ExprKind::Identifier(name) => out.push_str(name),
        ExprKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            out.push('{');
            write_expr(then_branch, out);
            out.push_str(" if ");
            write_expr(condition, out);
            out.push_str(" else ");
            write_expr(else_branch, out);
            out.push('}');
        }
        ExprKind::Where { body, bindings } => {
            out.push('{');
            write_expr(body, out);
            out.push_str(" where {");
            for (i, binding) in bindings.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push('[');
                out.push_str(&binding.name);
                out.push_str(" := ");
                write_expr(&binding.value, out);
                out.push(']');
            }
            out.push_str("}}");
        }
        ExprKind::Lambda { params, body } => {
            out.push_str("{{");
            out.push_str(&params.join(" "));
            out.push_str("} => ");
            write_expr(body, out);
            out.push('}');
        }
        ExprKind::Application { callee, args } => {
            out.push('{');
            write_expr(callee, out);
            for arg in args {
                out.push(' ');
                write_expr(arg, out);
            }
            out.push('}');
        }
    }
}

pub fn format_definition(definition: &Definition) -> String {
    let mut head = vec![definition.name.as_ref()];
    head.extend(definition.params.iter().map(|p| p.as_ref()));
    format!("{{def {{{}}} = {}}}", head.join(" "), format_expr(&definition.body))
}

/// One definition per line, in source order.
pub fn format_program(program: &Program) -> String {
    program
        .definitions
        .iter()
        .map(format_definition)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SourceId;
    use crate::interpreter::parse_program;

    fn canonical(source: &str) -> String {
        format_program(&parse_program(source, SourceId(0)).expect("program should parse"))
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(3.25), "3.25");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(-7.5), "-7.5");
        assert_eq!(format_number(1e21), "1000000000000000000000");
    }

    #[test]
    fn test_string_quotes() {
        assert_eq!(format_string_literal("hi"), "\"hi\"");
        assert_eq!(format_string_literal("say \"hi\""), "'say \"hi\"'");
    }

    #[test]
    fn test_canonical_layout() {
        let source = "{def   {f x y}=\n  {{+ x y} if x else {g y}}}  # done\n{def {k} = 'k'}";
        assert_eq!(
            canonical(source),
            "{def {f x y} = {{+ x y} if x else {g y}}}\n{def {k} = \"k\"}"
        );
    }

    #[test]
    fn test_where_and_lambda() {
        let source = "{def {f} = {{h 1} where {[h := {{n} => {* n 2}}] [z := 0.50]}}}";
        assert_eq!(
            canonical(source),
            "{def {f} = {{h 1} where {[h := {{n} => {* n 2}}] [z := 0.5]}}}"
        );
    }

    #[test]
    fn test_canonical_text_is_a_fixed_point() {
        let source = "{def {fact n} = {1 if {< n 2} else {* n {fact {- n 1}}}}}\n\
                      {def {greet name} = {++ \"hello \" name}}\n\
                      {def {pair} = {{{x} => {{y} => {x y}}} 'a'}}\n\
                      {def {empty} = {{w} where {}}}";
        let once = canonical(source);
        assert_eq!(canonical(&once), once);
    }
}
