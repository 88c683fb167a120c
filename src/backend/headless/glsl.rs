// GLSL interface scanner
//
// Not a compiler. It finds the global `uniform` and `in`/`attribute`
// declarations a linker needs for location assignment, and rejects sources
// that have no `main` or unbalanced braces.

use crate::backend::ShaderType;

/// A global variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// GLSL type name as written (`vec3`, `mat4`, `sampler2D`, ...).
    pub ty: String,
    pub name: String,
    /// `layout(location = N)`, if given.
    pub location: Option<u32>,
}

/// The linkable interface of one shader stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    pub uniforms: Vec<Declaration>,
    /// Vertex attributes. Always empty for non-vertex stages.
    pub attributes: Vec<Declaration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Storage {
    Uniform,
    Input,
    Output,
}

const QUALIFIERS: &[&str] = &[
    "const", "flat", "smooth", "noperspective", "centroid", "invariant", "highp", "mediump",
    "lowp", "precise",
];

/// Scan `source` for its interface. The error string becomes the info log.
pub fn scan(source: &str, stage: ShaderType) -> Result<ShaderInterface, String> {
    let tokens = tokenize(&strip_comments(source));

    let mut has_main = false;
    let mut depth = 0i32;
    let mut statement: Vec<&str> = Vec::new();
    let mut interface = ShaderInterface::default();

    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "{" => {
                if depth == 0 {
                    // Function body or interface block: not a plain declaration
                    statement.clear();
                }
                depth += 1;
            }
            "}" => {
                depth -= 1;
                if depth < 0 {
                    return Err(format!("ERROR: unexpected '}}' (token {})", i));
                }
            }
            ";" if depth == 0 => {
                declare(&statement, stage, &mut interface)?;
                statement.clear();
            }
            t => {
                if depth == 0 {
                    statement.push(t);
                }
                if t == "main" && tokens.get(i + 1).map(String::as_str) == Some("(") {
                    has_main = true;
                }
            }
        }
    }

    if depth != 0 {
        return Err("ERROR: unbalanced braces, unexpected end of source".to_string());
    }
    if !has_main {
        return Err("ERROR: missing entry point 'main'".to_string());
    }

    Ok(interface)
}

/// Record one global statement if it declares a uniform or attribute.
fn declare(
    statement: &[&str],
    stage: ShaderType,
    interface: &mut ShaderInterface,
) -> Result<(), String> {
    let mut storage = None;
    let mut location = None;
    let mut rest = Vec::with_capacity(statement.len());
    let mut iter = statement.iter().copied();

    while let Some(token) = iter.next() {
        match token {
            "layout" => {
                let mut qualifiers = Vec::new();
                for t in iter.by_ref() {
                    if t == ")" {
                        break;
                    }
                    qualifiers.push(t);
                }
                location = layout_location(&qualifiers)?.or(location);
            }
            "uniform" => storage = Some(Storage::Uniform),
            "in" | "attribute" => storage = Some(Storage::Input),
            "out" | "varying" => storage = Some(Storage::Output),
            t if QUALIFIERS.contains(&t) => {}
            t => rest.push(t),
        }
    }

    let storage = match storage {
        Some(s) => s,
        None => return Ok(()),
    };

    // `void f(in vec3 x);` is a prototype, not a declaration
    if rest.get(2) == Some(&"(") {
        return Ok(());
    }

    let (ty, names) = match rest.split_first() {
        Some((ty, names)) if is_identifier(ty) => (*ty, names),
        _ => return Err(format!("ERROR: malformed declaration '{}'", statement.join(" "))),
    };

    let declared = declared_names(names);
    if declared.is_empty() {
        return Err(format!("ERROR: declaration of '{}' has no name", ty));
    }

    let target = match (storage, stage) {
        (Storage::Uniform, _) => &mut interface.uniforms,
        (Storage::Input, ShaderType::Vertex) => &mut interface.attributes,
        _ => return Ok(()),
    };
    for name in declared {
        target.push(Declaration {
            ty: ty.to_string(),
            name: name.to_string(),
            location,
        });
    }
    Ok(())
}

/// The `location = N` entry of a `layout( ... )` qualifier list.
fn layout_location(qualifiers: &[&str]) -> Result<Option<u32>, String> {
    let position = match qualifiers.iter().position(|&t| t == "location") {
        Some(position) => position,
        None => return Ok(None),
    };
    match qualifiers.get(position + 1..position + 3) {
        Some(&["=", value]) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("ERROR: invalid location '{}'", value)),
        _ => Err("ERROR: layout location requires a value".to_string()),
    }
}

/// Names in `a, b[4], c = 1.0`: identifiers at the start of each
/// comma-separated item, skipping array sizes and initializers.
fn declared_names<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    let mut names = Vec::new();
    let mut expect_name = true;
    let mut nesting = 0;

    for &t in tokens {
        match t {
            "[" | "(" => nesting += 1,
            "]" | ")" => nesting -= 1,
            "," if nesting == 0 => expect_name = true,
            t if expect_name && nesting == 0 && is_identifier(t) => {
                names.push(t);
                expect_name = false;
            }
            _ => {}
        }
    }
    names
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Drop `//` and `/* */` comments and preprocessor lines.
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut line_start = true;

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
                line_start = true;
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            '#' if line_start => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            c => {
                if c == '\n' {
                    line_start = true;
                } else if !c.is_whitespace() {
                    line_start = false;
                }
                out.push(c);
            }
        }
    }
    out
}

/// Split into identifier/number words and single punctuation characters.
fn tokenize(source: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in source.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(std::mem::take(&mut word));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !word.is_empty() {
        tokens.push(word);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(decls: &[Declaration]) -> Vec<&str> {
        decls.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn finds_vertex_interface() {
        let src = r#"
            #version 330 core
            layout(location = 0) in vec3 a_position;
            in vec3 a_normal; // per-vertex normal
            out vec3 v_normal;
            uniform mat4 u_model, u_view;
            uniform highp float u_time;
            void main() {
                vec3 in_local = a_position;
                gl_Position = vec4(in_local, 1.0);
            }
        "#;
        let iface = scan(src, ShaderType::Vertex).unwrap();
        assert_eq!(names(&iface.attributes), vec!["a_position", "a_normal"]);
        assert_eq!(iface.attributes[0].location, Some(0));
        assert_eq!(iface.attributes[1].location, None);
        assert_eq!(names(&iface.uniforms), vec!["u_model", "u_view", "u_time"]);
        assert_eq!(iface.uniforms[2].ty, "float");
    }

    #[test]
    fn fragment_inputs_are_not_attributes() {
        let src = "in vec3 v_normal; uniform vec4 u_tint; out vec4 o; void main() { o = u_tint; }";
        let iface = scan(src, ShaderType::Fragment).unwrap();
        assert!(iface.attributes.is_empty());
        assert_eq!(names(&iface.uniforms), vec!["u_tint"]);
    }

    #[test]
    fn arrays_initializers_and_blocks() {
        let src = "
            uniform vec4 u_lights[4], u_ambient = vec4(0.1, 0.1, 0.1, 1.0);
            uniform Camera { mat4 view; mat4 proj; } camera;
            /* uniform float u_commented; */
            void main() {}
        ";
        let iface = scan(src, ShaderType::Fragment).unwrap();
        assert_eq!(names(&iface.uniforms), vec!["u_lights", "u_ambient"]);
    }

    #[test]
    fn reads_layout_locations() {
        let src = "
            layout(location = 3) in vec3 a_position;
            layout(std140, location=7) uniform vec4 u_tint;
            layout(location = 1) uniform float u_a, u_b;
            void main() {}
        ";
        let iface = scan(src, ShaderType::Vertex).unwrap();
        assert_eq!(iface.attributes[0].location, Some(3));
        let uniforms: Vec<_> = iface.uniforms.iter().map(|d| d.location).collect();
        assert_eq!(uniforms, vec![Some(7), Some(1), Some(1)]);
    }

    #[test]
    fn rejects_malformed_layout_location() {
        assert!(scan("layout(location) in vec3 a; void main() {}", ShaderType::Vertex).is_err());
        assert!(scan("layout(location = x) in vec3 a; void main() {}", ShaderType::Vertex).is_err());
    }

    #[test]
    fn rejects_missing_main() {
        let err = scan("uniform float x;", ShaderType::Vertex).unwrap_err();
        assert!(err.contains("main"));
    }

    #[test]
    fn rejects_unbalanced_braces() {
        assert!(scan("void main() {", ShaderType::Vertex).is_err());
        assert!(scan("void main() { } }", ShaderType::Vertex).is_err());
    }

    #[test]
    fn rejects_nameless_declaration() {
        assert!(scan("uniform vec4; void main() {}", ShaderType::Vertex).is_err());
    }
}
