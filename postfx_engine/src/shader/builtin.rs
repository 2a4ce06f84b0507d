/// Built-in GLSL sources
///
/// Pass shaders only provide a fragment stage; they are linked against
/// `PASS_VERTEX_SHADER`, which expands the 6-vertex quad (attribute 0, `vec2`
/// in clip space) and forwards `texCoord` in [0, 1].

/// Vertex stage shared by every pass shader and the compositor
pub const PASS_VERTEX_SHADER: &str = r#"#version 330 core
layout (location = 0) in vec2 aPos;
out vec2 texCoord;
void main()
{
    texCoord = aPos * 0.5 + 0.5;
    gl_Position = vec4(aPos, 0.0, 1.0);
}
"#;

/// Sampler receiving the final running output (slot 0)
pub const COMPOSITE_COLOR_UNIFORM: &str = "colorImage";

/// Sampler receiving the host depth image (slot 1)
pub const COMPOSITE_DEPTH_UNIFORM: &str = "depthImage";

/// Fragment stage of the compositing shader
pub const COMPOSITE_FRAGMENT_SHADER: &str = r#"#version 330 core
in vec2 texCoord;
uniform sampler2D colorImage;
uniform sampler2D depthImage;
out vec4 fragColor;
void main()
{
    fragColor = texture(colorImage, texCoord);
    gl_FragDepth = texture(depthImage, texCoord).r;
}
"#;
