use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::core::archive::ArchiveOutput;
use crate::core::error::ArchitectResult;

const MIXIN_LISTS: [&str; 3] = ["mixins", "client", "server"];

/// What a root-level JSON object looks like to the refmap pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixinConfigShape {
    /// Has `package` and at least one of `mixins`/`client`/`server` as an array.
    Mixin { has_refmap: bool, has_min_version: bool },
    Other,
}

impl MixinConfigShape {
    pub fn classify(object: &Map<String, Value>) -> Self {
        let is_mixin = object.contains_key("package")
            && MIXIN_LISTS
                .iter()
                .any(|key| object.get(*key).map_or(false, Value::is_array));
        if !is_mixin {
            return MixinConfigShape::Other;
        }
        MixinConfigShape::Mixin {
            has_refmap: object.contains_key("refmap"),
            has_min_version: object.contains_key("minVersion"),
        }
    }

    /// Mixin configs lacking `refmap` or `minVersion`.
    pub fn is_candidate(self) -> bool {
        matches!(
            self,
            MixinConfigShape::Mixin { has_refmap, has_min_version }
                if !has_refmap || !has_min_version
        )
    }
}

/// Points mixin configs at the refmap generated for the mod.
#[derive(Debug, Clone)]
pub struct AddRefmapName {
    refmap_name: String,
}

impl AddRefmapName {
    pub fn new(refmap_name: impl Into<String>) -> Self {
        Self {
            refmap_name: refmap_name.into(),
        }
    }

    /// Returns the entries that were rewritten.
    pub fn apply(&self, output: &mut dyn ArchiveOutput) -> ArchitectResult<Vec<String>> {
        let mut candidates = Vec::new();
        for name in output.entries()? {
            if !is_root_json(&name) {
                continue;
            }
            let Some(object) = read_object(output, &name)? else {
                continue;
            };
            if MixinConfigShape::classify(&object).is_candidate() {
                candidates.push(name);
            }
        }

        let mut rewritten = Vec::new();
        for name in candidates {
            let Some(mut object) = read_object(output, &name)? else {
                continue;
            };
            if object.contains_key("refmap") {
                continue;
            }
            object.insert("refmap".into(), Value::String(self.refmap_name.clone()));
            output.modify_file(&name, serde_json::to_vec_pretty(&Value::Object(object))?)?;
            info!("added refmap '{}' to {}", self.refmap_name, name);
            rewritten.push(name);
        }
        Ok(rewritten)
    }
}

fn is_root_json(name: &str) -> bool {
    let name = name.strip_prefix('/').unwrap_or(name);
    !name.contains('/') && !name.contains('\\') && name.ends_with(".json")
}

fn read_object(
    output: &mut dyn ArchiveOutput,
    name: &str,
) -> ArchitectResult<Option<Map<String, Value>>> {
    let Some(bytes) = output.get_file(name)? else {
        return Ok(None);
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(object)) => Ok(Some(object)),
        Ok(_) => Ok(None),
        Err(e) => {
            debug!("skipping {}: not valid JSON ({})", name, e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::archive::DirectoryOutput;
    use serde_json::json;

    fn output_with(files: &[(&str, &str)]) -> (tempfile::TempDir, DirectoryOutput) {
        let dir = tempfile::tempdir().unwrap();
        let mut output = DirectoryOutput::new(dir.path());
        for (name, content) in files {
            output.add_file(name, content.as_bytes().to_vec()).unwrap();
        }
        (dir, output)
    }

    fn read(output: &mut DirectoryOutput, name: &str) -> Value {
        serde_json::from_slice(&output.get_file(name).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn adds_refmap_to_mixin_configs() {
        let (_dir, mut output) = output_with(&[(
            "examplemod.mixins.json",
            r#"{"package":"a.b","mixins":["X"]}"#,
        )]);

        let changed = AddRefmapName::new("r.json").apply(&mut output).unwrap();

        assert_eq!(changed, vec!["examplemod.mixins.json"]);
        assert_eq!(
            read(&mut output, "examplemod.mixins.json"),
            json!({"package": "a.b", "mixins": ["X"], "refmap": "r.json"})
        );
    }

    #[test]
    fn existing_refmap_is_kept() {
        let original = r#"{"package":"a.b","client":[],"refmap":"own.json"}"#;
        let (_dir, mut output) = output_with(&[("client.mixins.json", original)]);

        let changed = AddRefmapName::new("r.json").apply(&mut output).unwrap();

        assert!(changed.is_empty());
        assert_eq!(
            output.get_file("client.mixins.json").unwrap().unwrap(),
            original.as_bytes()
        );
    }

    #[test]
    fn objects_without_package_are_not_mixin_configs() {
        let (_dir, mut output) = output_with(&[
            ("a.json", r#"{"mixins":[]}"#),
            ("b.json", r#"{"package":"a.b","mixins":"not-a-list"}"#),
        ]);

        assert!(AddRefmapName::new("r.json").apply(&mut output).unwrap().is_empty());
        assert_eq!(read(&mut output, "a.json"), json!({"mixins": []}));
    }

    #[test]
    fn nested_and_invalid_files_are_skipped() {
        let (_dir, mut output) = output_with(&[
            ("assets/examplemod/x.mixins.json", r#"{"package":"a","mixins":[]}"#),
            ("broken.json", "{ not json"),
            ("list.json", "[1, 2]"),
            ("notes.txt", r#"{"package":"a","mixins":[]}"#),
        ]);

        assert!(AddRefmapName::new("r.json").apply(&mut output).unwrap().is_empty());
    }

    #[test]
    fn second_run_changes_nothing() {
        let (_dir, mut output) = output_with(&[(
            "m.json",
            r#"{"package":"a.b","server":["S"],"minVersion":"0.8"}"#,
        )]);
        let pass = AddRefmapName::new("r.json");

        pass.apply(&mut output).unwrap();
        let after_first = output.get_file("m.json").unwrap().unwrap();
        assert!(pass.apply(&mut output).unwrap().is_empty());
        assert_eq!(output.get_file("m.json").unwrap().unwrap(), after_first);
    }

    #[test]
    fn classification() {
        let shape = |v: Value| MixinConfigShape::classify(v.as_object().unwrap());

        assert_eq!(shape(json!({"mixins": []})), MixinConfigShape::Other);
        assert!(shape(json!({"package": "p", "mixins": []})).is_candidate());
        assert!(shape(json!({"package": "p", "mixins": [], "refmap": "x"})).is_candidate());
        assert!(!shape(json!({"package": "p", "mixins": [], "refmap": "x", "minVersion": "0.8"}))
            .is_candidate());
    }
}
