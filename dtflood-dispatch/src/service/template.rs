//! Service templates
//!
//! A missing service is created from `<template_dir>/<name>.yaml`, an OSCAR
//! FDL document whose `script` fields point at shell scripts. Relative
//! script paths are resolved against the template directory and the script
//! body is inlined, since the API expects the script content.

use dtflood_core::dto::service::{FdlDocument, ServiceDefinition};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{DispatchError, Result};

/// Location of the template for a service
pub fn template_path(template_dir: &Path, service: &str) -> PathBuf {
    template_dir.join(format!("{}.yaml", service))
}

/// Loads every service definition in the template for `service`
///
/// Fails when the template does not define `service` itself.
pub fn load_template(template_dir: &Path, service: &str) -> Result<Vec<ServiceDefinition>> {
    let path = template_path(template_dir, service);
    let template_error = |reason: String| DispatchError::Template {
        path: path.clone(),
        reason,
    };

    let text = fs::read_to_string(&path).map_err(|e| template_error(e.to_string()))?;
    let document: FdlDocument =
        serde_yaml::from_str(&text).map_err(|e| template_error(e.to_string()))?;

    let mut services = document.into_services();
    if !services.iter().any(|s| s.name == service) {
        return Err(template_error(format!(
            "template does not define service '{}'",
            service
        )));
    }

    for definition in &mut services {
        let script = definition.script.as_deref().ok_or_else(|| {
            template_error(format!("service '{}' has no script", definition.name))
        })?;

        let script_path = resolve_script(template_dir, script);
        debug!(
            "Inlining script {} for service '{}'",
            script_path.display(),
            definition.name
        );

        let body = fs::read_to_string(&script_path).map_err(|e| {
            template_error(format!("cannot read script {}: {}", script_path.display(), e))
        })?;
        definition.script = Some(body);
    }

    Ok(services)
}

fn resolve_script(template_dir: &Path, script: &str) -> PathBuf {
    let script = Path::new(script);
    if script.is_absolute() {
        script.to_path_buf()
    } else {
        template_dir.join(script)
    }
}
