// SPDX-License-Identifier: GPL-3.0-only
//! Compute kernel sources and pipelines
//!
//! The device-side `Pixel` struct is generated from [`PIXEL_SCHEMA`], the same
//! schema the host `Pixel` record is checked against, so the two layouts
//! cannot drift apart.

mod gpu_processor;
pub mod gpu_utils;
mod luma_diff;

pub use gpu_processor::{compute_dispatch_size, dispatch_grid, read_buffer_async};
pub use luma_diff::{LUMA_DIFF_ENTRY_POINT, LumaDiffParams, LumaDiffPipeline};

use crate::constants::{LUMA_WEIGHTS, WORKGROUP_SIZE};

/// One field of the shared pixel record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaField {
    /// Field name, identical on host and device
    pub name: &'static str,
    /// WGSL scalar type
    pub wgsl_type: &'static str,
    /// Size in bytes
    pub size: usize,
}

/// Field order and widths of a packed pixel (R, G, B as 32-bit signed ints)
pub const PIXEL_SCHEMA: [SchemaField; 3] = [
    SchemaField {
        name: "x",
        wgsl_type: "i32",
        size: 4,
    },
    SchemaField {
        name: "y",
        wgsl_type: "i32",
        size: 4,
    },
    SchemaField {
        name: "z",
        wgsl_type: "i32",
        size: 4,
    },
];

/// Total byte size of one pixel record according to [`PIXEL_SCHEMA`]
pub const fn schema_size() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < PIXEL_SCHEMA.len() {
        total += PIXEL_SCHEMA[i].size;
        i += 1;
    }
    total
}

const LUMA_DIFF_BODY: &str = include_str!("luma_diff.wgsl");

/// WGSL declaration of the `Pixel` struct
pub fn pixel_struct_wgsl() -> String {
    let mut out = String::from("struct Pixel {\n");
    for field in PIXEL_SCHEMA {
        out.push_str(&format!("    {}: {},\n", field.name, field.wgsl_type));
    }
    out.push_str("}\n");
    out
}

/// Complete kernel source: generated prelude followed by the kernel body
///
/// The weights are emitted as `f64` literals (`lf` suffix) with the shortest
/// representation that round-trips, so the device sees the host's exact bits.
pub fn luma_diff_source() -> String {
    let [r, g, b] = LUMA_WEIGHTS;
    format!(
        "{}\nconst WORKGROUP_SIZE: u32 = {}u;\nconst LUMA_WEIGHTS: vec3<f64> = vec3<f64>({:?}lf, {:?}lf, {:?}lf);\n\n{}",
        pixel_struct_wgsl(),
        WORKGROUP_SIZE,
        r,
        g,
        b,
        LUMA_DIFF_BODY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse and validate WGSL with naga, returning the module
    fn validate_shader(name: &str, source: &str) -> naga::Module {
        let module = match naga::front::wgsl::parse_str(source) {
            Ok(module) => module,
            Err(e) => panic!("Shader '{}' parse failed: {:?}", name, e),
        };

        let info = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        )
        .validate(&module);

        if let Err(e) = info {
            panic!("Shader '{}' validation failed: {:?}", name, e);
        }
        module
    }

    #[test]
    fn test_luma_diff_shader_validates() {
        let module = validate_shader("luma_diff", &luma_diff_source());
        assert!(
            module
                .entry_points
                .iter()
                .any(|ep| ep.name == LUMA_DIFF_ENTRY_POINT)
        );
    }

    #[test]
    fn test_device_pixel_layout_matches_schema() {
        let module = validate_shader("luma_diff", &luma_diff_source());

        let (_, pixel) = module
            .types
            .iter()
            .find(|(_, ty)| ty.name.as_deref() == Some("Pixel"))
            .expect("Pixel struct missing from kernel");
        match &pixel.inner {
            naga::TypeInner::Struct { members, span } => {
                assert_eq!(*span as usize, schema_size());
                let names: Vec<_> = members.iter().filter_map(|m| m.name.as_deref()).collect();
                let expected: Vec<_> = PIXEL_SCHEMA.iter().map(|f| f.name).collect();
                assert_eq!(names, expected);
            }
            other => panic!("Pixel is not a struct: {:?}", other),
        }

        // Runtime-sized storage arrays of Pixel must be tightly packed
        let stride = module
            .types
            .iter()
            .find_map(|(_, ty)| match ty.inner {
                naga::TypeInner::Array { base, stride, .. }
                    if module.types[base].name.as_deref() == Some("Pixel") =>
                {
                    Some(stride)
                }
                _ => None,
            })
            .expect("array<Pixel> missing from kernel");
        assert_eq!(stride as usize, schema_size());
    }

    #[test]
    fn test_kernel_needs_float64() {
        // Devices without SHADER_F64 cannot run the kernel
        let module = naga::front::wgsl::parse_str(&luma_diff_source()).unwrap();
        let result = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all() - naga::valid::Capabilities::FLOAT64,
        )
        .validate(&module);
        assert!(result.is_err());
    }

    #[test]
    fn test_weights_emitted_as_f64_literals() {
        assert!(
            luma_diff_source()
                .contains("const LUMA_WEIGHTS: vec3<f64> = vec3<f64>(0.299lf, 0.587lf, 0.114lf);")
        );
    }

    #[test]
    fn test_pixel_struct_declaration() {
        assert_eq!(
            pixel_struct_wgsl(),
            "struct Pixel {\n    x: i32,\n    y: i32,\n    z: i32,\n}\n"
        );
    }

    #[test]
    fn test_schema_size() {
        assert_eq!(schema_size(), 12);
    }
}
