//! Listing of the C functions defined in a source file
//!
//! A regex scan, not a parser: it looks for top-level definitions that start
//! at column zero and are followed by a body.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

const NOT_FUNCTIONS: &[&str] = &[
    "if", "for", "while", "switch", "return", "sizeof", "else", "do", "typedef",
];

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FunctionInfo {
    pub name: String,
    /// Declaration with whitespace collapsed, e.g. `int foo(const char *s)`
    pub signature: String,
    /// 1-based line of the function name
    pub line: usize,
}

fn definition_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Captures: return type and qualifiers, name, parameter list
        Regex::new(r"(?m)^((?:[A-Za-z_]\w*[\s\*]+)+?)([A-Za-z_]\w*)\s*\(([^;{}()]*)\)\s*\{")
            .expect("Invalid function definition pattern")
    })
}

/// Functions defined in `source`, in source order, first definition wins.
pub fn list_functions(source: &str) -> Vec<FunctionInfo> {
    let mut seen = HashSet::new();
    let mut functions = Vec::new();

    for caps in definition_pattern().captures_iter(source) {
        let (Some(prefix), Some(name), Some(params)) = (caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };

        let leading = prefix.as_str().split_whitespace().next().unwrap_or_default();
        if NOT_FUNCTIONS.contains(&name.as_str()) || NOT_FUNCTIONS.contains(&leading) {
            continue;
        }

        if !seen.insert(name.as_str()) {
            continue;
        }

        let return_type = collapse_whitespace(prefix.as_str());
        let separator = if return_type.ends_with('*') { "" } else { " " };
        let signature = format!(
            "{}{}{}({})",
            return_type,
            separator,
            name.as_str(),
            collapse_whitespace(params.as_str())
        );

        functions.push(FunctionInfo {
            name: name.as_str().to_string(),
            signature,
            line: source[..name.start()].matches('\n').count() + 1,
        });
    }

    functions
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"#include "json_object.h"
#define CHECK(x) { if (!(x)) return -1; }

static int json_object_int_to_json_string(struct json_object *jso,
                                          struct printbuf *pb, int level)
{
    if (level > 0) {
        return 1;
    }
    return 0;
}

int32_t json_object_get_int(const struct json_object *jso)
{
    while (jso) {
        break;
    }
    return helper(jso);
}

struct json_object *json_object_get(struct json_object *jso) {
    return jso;
}

int json_object_get_int(const struct json_object *jso);

JSON_EXPORT void
json_c_set_serialization_double_format(void)
{
}
"#;

    #[test]
    fn test_lists_definitions_in_order() {
        let names: Vec<_> = list_functions(SOURCE).into_iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "json_object_int_to_json_string",
                "json_object_get_int",
                "json_object_get",
                "json_c_set_serialization_double_format",
            ]
        );
    }

    #[test]
    fn test_signature_is_normalized() {
        let functions = list_functions(SOURCE);

        assert_eq!(
            functions[0].signature,
            "static int json_object_int_to_json_string(struct json_object *jso, struct printbuf *pb, int level)"
        );
        assert_eq!(
            functions[2].signature,
            "struct json_object *json_object_get(struct json_object *jso)"
        );
        assert_eq!(
            functions[3].signature,
            "JSON_EXPORT void json_c_set_serialization_double_format(void)"
        );
    }

    #[test]
    fn test_line_numbers() {
        let functions = list_functions(SOURCE);
        assert_eq!(functions[0].line, 4);
        assert_eq!(functions[1].line, 13);
    }

    #[test]
    fn test_skips_control_flow_and_prototypes() {
        let functions = list_functions("int main(void);\nelse if (x) {\n}\n");
        assert!(functions.is_empty());
    }

    #[test]
    fn test_empty_source() {
        assert!(list_functions("").is_empty());
    }
}
