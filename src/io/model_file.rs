//! Read/write model JSON files.
//!
//! Model JSON is the portable representation of a composite model:
//! - a list of components (kind + parameter overrides)
//! - optional image pixel grids
//! - optional parameter links and flux normalization
//! - fit metadata when written back after a run (chi-square, errors)
//!
//! Parameter specs override the component's standard defaults field by
//! field, so a minimal file only states what differs (usually `value` and
//! `free`). Bounds are optional in JSON; absent means the standard bound.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::{build, ImageComponent};
use crate::domain::ComponentKind;
use crate::error::AppError;
use crate::model::{LinkOp, Model, ParamLink};
use crate::params::{Interp, Unit};

/// One parameter override. Missing fields keep the standard defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interp: Option<Interp>,
}

/// One component entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    #[serde(default)]
    pub params: BTreeMap<String, ParamSpec>,
    /// Image components only: grid side length and row-major pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixels: Option<Vec<f64>>,
}

/// A parameter link, addressed by zero-based component index and
/// parameter name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSpec {
    pub target: (usize, String),
    pub source: (usize, String),
    /// "add" or "mult".
    pub op: String,
    pub factor: f64,
}

/// The model file schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub name: String,
    pub components: Vec<ComponentSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    /// Zero-based index of the component whose flux absorbs the remainder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize_flux: Option<usize>,
    /// Reduced chi-square of the last run, written on save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduced_chi2: Option<f64>,
}

/// Read a model JSON file and build the model.
pub fn read_model_json(path: &Path) -> Result<Model, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let spec: ModelFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    build_model(&spec)
}

/// Build a model from a parsed file.
pub fn build_model(file: &ModelFile) -> Result<Model, AppError> {
    if file.components.is_empty() {
        return Err(AppError::new(2, "Model JSON has no components"));
    }
    let mut model = Model::new(&file.name);

    for (ci, spec) in file.components.iter().enumerate() {
        let mut component = if spec.kind == ComponentKind::Image {
            let (Some(dim), Some(pixels)) = (spec.dim, spec.pixels.clone()) else {
                return Err(AppError::new(
                    2,
                    format!("Image component {} needs 'dim' and 'pixels'", ci + 1),
                ));
            };
            let mut img = ImageComponent::new();
            if !img.set_pixels(dim, pixels) {
                return Err(AppError::new(
                    2,
                    format!(
                        "Image component {}: pixels must be dim*dim values with a positive sum",
                        ci + 1
                    ),
                ));
            }
            Box::new(img) as Box<dyn crate::components::Component>
        } else {
            build(spec.kind)
        };

        for (name, p) in &spec.params {
            let param = component
                .params_mut()
                .into_iter()
                .find(|q| q.name == *name)
                .ok_or_else(|| {
                    AppError::new(
                        2,
                        format!(
                            "Component {} ({}) has no parameter '{name}'",
                            ci + 1,
                            spec.kind.display_name()
                        ),
                    )
                })?;
            if let Some(v) = p.value {
                param.value = v;
            }
            if let Some(v) = p.error {
                param.error = v;
            }
            if let Some(v) = p.min {
                param.min = v;
            }
            if let Some(v) = p.max {
                param.max = v;
            }
            if let Some(v) = p.free {
                param.free = v;
            }
            if let Some(v) = p.unit {
                param.unit = v;
            }
            if let Some(i) = &p.interp {
                param.interp = Some(i.clone());
            }
        }

        model.add(component);
    }

    for link in &file.links {
        let op = match link.op.as_str() {
            "add" => LinkOp::Add,
            "mult" => LinkOp::Mult,
            other => {
                return Err(AppError::new(
                    2,
                    format!("Unknown link op '{other}' (expected 'add' or 'mult')"),
                ))
            }
        };
        model.add_link(ParamLink {
            target: link.target.clone(),
            source: link.source.clone(),
            op,
            factor: link.factor,
        })?;
    }

    if let Some(idx) = file.normalize_flux {
        model.normalize_total_flux(idx)?;
    }

    Ok(model)
}

/// Write a model (typically after fitting) back to JSON, with every
/// parameter spelled out.
pub fn write_model_json(
    path: &Path,
    model: &Model,
    reduced_chi2: Option<f64>,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;
    let spec = model_to_file(model, reduced_chi2);
    serde_json::to_writer_pretty(file, &spec)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;
    Ok(())
}

/// Snapshot a model into the file schema. Infinite bounds are omitted
/// (JSON has no infinity).
pub fn model_to_file(model: &Model, reduced_chi2: Option<f64>) -> ModelFile {
    let components = model
        .components
        .iter()
        .map(|c| {
            let params = c
                .params()
                .into_iter()
                .map(|p| {
                    (
                        p.name.clone(),
                        ParamSpec {
                            value: Some(p.value),
                            error: (p.error != 0.0).then_some(p.error),
                            min: p.min.is_finite().then_some(p.min),
                            max: p.max.is_finite().then_some(p.max),
                            free: Some(p.free),
                            unit: Some(p.unit),
                            interp: p.interp.clone(),
                        },
                    )
                })
                .collect();
            let (dim, pixels) = match c.image_grid() {
                Some((dim, px)) => (Some(dim), Some(px.to_vec())),
                None => (None, None),
            };
            ComponentSpec {
                kind: c.kind(),
                params,
                dim,
                pixels,
            }
        })
        .collect();

    ModelFile {
        name: model.name.clone(),
        components,
        links: model
            .links()
            .iter()
            .map(|l| LinkSpec {
                target: l.target.clone(),
                source: l.source.clone(),
                op: match l.op {
                    LinkOp::Add => "add".to_string(),
                    LinkOp::Mult => "mult".to_string(),
                },
                factor: l.factor,
            })
            .collect(),
        normalize_flux: model.normalized_flux(),
        reduced_chi2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_binary_from_json() {
        let json = r#"{
            "name": "disk+companion",
            "components": [
                {
                    "kind": "uniform_disk",
                    "params": {
                        "d": { "value": 3.0, "min": 0.5, "max": 10.0 },
                        "f": { "value": 0.7 }
                    }
                },
                {
                    "kind": "point",
                    "params": {
                        "x": { "value": 5.0, "free": true },
                        "y": { "value": -2.0 }
                    }
                }
            ],
            "normalize_flux": 1
        }"#;
        let spec: ModelFile = serde_json::from_str(json).unwrap();
        let model = build_model(&spec).unwrap();

        assert_eq!(model.components.len(), 2);
        let d = model.param(0, "d").unwrap();
        assert_eq!(d.value, 3.0);
        assert_eq!(d.min, 0.5);
        assert!(model.param(1, "x").unwrap().free);
        // Normalized flux: c2.f absorbs 1 - 0.7 and is fixed.
        let f = model.param(1, "f").unwrap();
        assert!(!f.free);
        assert!((f.value - 0.3).abs() < 1e-12);
    }

    #[test]
    fn unknown_parameter_is_an_error() {
        let json = r#"{
            "name": "bad",
            "components": [
                { "kind": "point", "params": { "diameter": { "value": 3.0 } } }
            ]
        }"#;
        let spec: ModelFile = serde_json::from_str(json).unwrap();
        let err = build_model(&spec).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn image_component_requires_pixels() {
        let json = r#"{
            "name": "img",
            "components": [ { "kind": "image", "params": {} } ]
        }"#;
        let spec: ModelFile = serde_json::from_str(json).unwrap();
        assert!(build_model(&spec).is_err());
    }

    #[test]
    fn interp_round_trips_through_json() {
        let json = r#"{
            "name": "fading",
            "components": [
                {
                    "kind": "gaussian",
                    "params": {
                        "f": {
                            "value": 1.0,
                            "interp": {
                                "kind": "power_law",
                                "dependence": "wl",
                                "x0": 2.2e-6,
                                "scale": 1.0,
                                "index": -4.0
                            }
                        }
                    }
                }
            ]
        }"#;
        let spec: ModelFile = serde_json::from_str(json).unwrap();
        let model = build_model(&spec).unwrap();
        let f = model.param(0, "f").unwrap();
        assert!(f.interp.is_some());
        // Flux falls toward longer wavelengths with a negative index.
        assert!(f.eval(2.2e-6, 0.0) > f.eval(2.4e-6, 0.0));

        let back = model_to_file(&model, Some(1.2));
        let text = serde_json::to_string(&back).unwrap();
        let again: ModelFile = serde_json::from_str(&text).unwrap();
        let model2 = build_model(&again).unwrap();
        assert!(model2.param(0, "f").unwrap().interp.is_some());
        assert_eq!(again.reduced_chi2, Some(1.2));
    }

    #[test]
    fn links_round_trip() {
        let json = r#"{
            "name": "linked",
            "components": [
                { "kind": "uniform_disk", "params": { "x": { "free": true } } },
                { "kind": "point", "params": {} }
            ],
            "links": [
                { "target": [1, "x"], "source": [0, "x"], "op": "add", "factor": 2.0 }
            ]
        }"#;
        let spec: ModelFile = serde_json::from_str(json).unwrap();
        let model = build_model(&spec).unwrap();
        assert!((model.param(1, "x").unwrap().value - 2.0).abs() < 1e-12);

        let back = model_to_file(&model, None);
        assert_eq!(back.links.len(), 1);
        assert_eq!(back.links[0].op, "add");
    }
}
