// Build script to validate GLSL shaders

use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=shaders/");

    // Validate shaders using glslangValidator (part of the Vulkan SDK / glslang)
    validate_shader("shaders/cube.vert");
    validate_shader("shaders/cube.frag");
}

fn validate_shader(input: &str) {
    let input_path = Path::new(input);

    // Check if glslangValidator is available
    let result = Command::new("glslangValidator").arg(input_path).status();

    match result {
        Ok(status) if status.success() => {
            println!("Validated {}", input);
        }
        Ok(status) => {
            panic!("Invalid shader {}: exit code {:?}", input, status.code());
        }
        Err(e) => {
            eprintln!("Warning: glslangValidator not found ({})", e);
            eprintln!("Shaders will not be validated. Install glslang or check manually:");
            eprintln!("  glslangValidator {}", input);
        }
    }
}
