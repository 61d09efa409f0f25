//! GLSL sources of the wireframe preview.

/// Attribute names, bound to locations 0 (position) and 1 (color).
pub const WIRE_ATTRIBUTES: [&str; 2] = ["I_Vertex", "I_Color"];

pub const WIRE_VERTEX_SHADER: &str = r#"#version 120

attribute vec3 I_Vertex;
attribute vec3 I_Color;

varying vec3 vColor;

void main()
{
    vColor = I_Color;
    gl_Position = gl_ModelViewProjectionMatrix * vec4(I_Vertex, 1.0);
}
"#;

pub const WIRE_FRAGMENT_SHADER: &str = r#"#version 120

varying vec3 vColor;

void main()
{
    gl_FragColor = vec4(vColor, 1.0);
}
"#;
