//! `eval` type: strings evaluated as HCL expressions in an empty context
//!
//! Only literals and operators are available (`1 + 2`, `[1, 2] == [1, 2]`, `"a" == "b" ? 1 : 2`),
//! any variable or function reference is an error.
use super::TypeError;
use crate::value::Value;
use hcl::eval::Evaluate;

pub(super) fn evaluate(source: &str) -> Result<Value, TypeError> {
    let expression: hcl_edit::expr::Expression = source
        .parse()
        .map_err(|err: hcl_edit::parser::Error| TypeError::Eval(err.to_string()))?;
    let expression: hcl::Expression = expression.into();

    let context = hcl::eval::Context::new();
    let value = expression
        .evaluate(&context)
        .map_err(|err| TypeError::Eval(err.to_string()))?;
    tracing::trace!(%source, ?value, "evaluated expression");

    Value::try_from(value).map_err(TypeError::Eval)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literals_and_operators() {
        assert_eq!(evaluate("1 + 2").unwrap(), Value::Integer(3));
        assert_eq!(evaluate("[1, \"a\"]").unwrap(), Value::List(vec![1_i64.into(), "a".into()]));
        assert_eq!(evaluate("2 > 1 ? \"yes\" : \"no\"").unwrap(), Value::from("yes"));
    }

    #[test]
    fn no_variables_in_scope() {
        assert!(matches!(evaluate("some_variable"), Err(TypeError::Eval(_))));
        assert!(matches!(evaluate("null"), Err(TypeError::Eval(_))));
        assert!(matches!(evaluate("1 +"), Err(TypeError::Eval(_))));
    }
}
