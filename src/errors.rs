#![allow(missing_docs)]

error_chain! {
    types {
        Error, ErrorKind, ResultExt, Result;
    }

    errors {
        DuplicateField(path: String) {
            description("duplicate field in query paths")
            display("duplicate field in query path '{}'", path)
        }
        MalformedQuery(path: String) {
            description("malformed query path")
            display("malformed query path '{}'", path)
        }
        UnbalancedBraces(pos: usize) {
            description("unbalanced braces")
            display("unbalanced brace at offset {}", pos)
        }
        MalformedString(pos: usize) {
            description("malformed string literal")
            display("malformed string literal near offset {}", pos)
        }
        MalformedLiteral(pos: usize) {
            description("malformed literal")
            display("malformed literal at offset {}", pos)
        }
        InternalInvariant(detail: &'static str) {
            description("internal invariant violated")
            display("internal invariant violated: {}", detail)
        }
    }
}
