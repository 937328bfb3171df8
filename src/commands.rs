use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::core::archive::{with_jar, ArchiveOutput, DirectoryOutput};
use crate::core::downloader::Downloader;
use crate::core::error::{ArchitectError, ArchitectResult};
use crate::core::java::find_java_binary;
use crate::core::launch::{setup_ide_runs, LaunchConfigPatcher, RunConfigStore};
use crate::core::maven::{MavenArtifact, MavenResolver};
use crate::core::packaging::{ExternalTransformer, JavaTransformerProcess, ProductionPackager};
use crate::core::platform::{
    Platform, TransformPlan, TransformPlanBuilder, TransformRegistration, TransformStep,
};
use crate::core::project::{
    ArchitecturySettings, BuildEngine, GeneratedArtifactFiles, ProjectContext, ProjectGraph,
    COMPILE_CLASSPATH, JAR_TASK, REMAP_JAR_TASK, SETTINGS_FILE, TRANSFORMER_CLASSPATH,
};
use crate::core::runtime::{PropertySources, RuntimeArtifactWriter, RuntimeProperties};
use crate::core::toolchain::{MappingsProvider, StaticToolchain};
use crate::core::transformers::AddRefmapName;

#[derive(Debug, Default, Serialize)]
pub struct PrepareReport {
    pub platforms: Vec<Platform>,
    pub manifest_entries: usize,
    pub properties: BTreeMap<String, String>,
    pub patched_runs: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CommonReport {
    pub production_tasks: Vec<String>,
    pub placeholders: Vec<PathBuf>,
    pub generate_srg_tiny: bool,
}

#[derive(Debug, Serialize)]
pub struct TransformReport {
    pub platform: Platform,
    pub input: PathBuf,
    pub output: PathBuf,
    pub steps: Vec<String>,
    pub refmap_added_to: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StepInfo {
    pub id: String,
    pub class_name: String,
}

#[derive(Debug, Serialize)]
pub struct FetchReport {
    pub requested: usize,
    pub downloaded: usize,
}

/// Write a default settings file into `project_dir`.
pub fn init(project_dir: &Path, platforms: &[Platform]) -> ArchitectResult<PathBuf> {
    let path = project_dir.join(SETTINGS_FILE);
    if path.exists() {
        return Err(ArchitectError::Other(format!(
            "{} already exists",
            path.display()
        )));
    }
    std::fs::create_dir_all(project_dir).map_err(|e| ArchitectError::io(project_dir, e))?;

    let settings = ArchitecturySettings {
        platforms: platforms.to_vec(),
        ..ArchitecturySettings::default()
    };
    settings.save(project_dir)?;
    info!("wrote {:?}", path);
    Ok(path)
}

/// Register platforms, write the runtime hand-off files and patch run configs.
///
/// `platforms` falls back to the settings' list when empty. IDE setup runs
/// whether or not any platform is registered.
pub fn prepare(
    project_dir: &Path,
    platforms: &[Platform],
    setup_ide: bool,
) -> ArchitectResult<PrepareReport> {
    let ctx = ProjectContext::load(project_dir)?;
    let mut graph = ctx.graph()?;
    let requested = if platforms.is_empty() {
        ctx.settings.platforms.as_slice()
    } else {
        platforms
    };
    let plan = configure_platforms(&ctx.settings, &mut graph, requested)?;

    let mut report = PrepareReport {
        platforms: plan.registrations().iter().map(|r| r.platform()).collect(),
        ..PrepareReport::default()
    };

    let store = RunConfigStore::new(ctx.runs_dir());
    let mut configs = store.list()?;
    if setup_ide {
        setup_ide_runs(&ctx.name(), &mut configs);
    }

    if plan.is_empty() {
        info!("no platforms registered, nothing to transform");
        if setup_ide {
            for config in &configs {
                store.save(config)?;
            }
        }
        return Ok(report);
    }

    let files = GeneratedArtifactFiles::prepare(&ctx.dir, &ctx.root_dir)?;
    let toolchain = ctx.toolchain();
    let sources = PropertySources {
        engine: &graph,
        toolchain: toolchain.as_ref().map(|t| t as &dyn MappingsProvider),
        inject_injectables: ctx.settings.inject_injectables,
        unique_identifier: ctx.unique_identifier()?,
    };
    if let Some(written) = RuntimeArtifactWriter::new(&files, sources).write(&plan)? {
        report.manifest_entries = written.manifest.entries().count();
        report.properties = written.properties.as_map().clone();
    }

    let patcher = LaunchConfigPatcher::new(&plan, &files);
    for config in &mut configs {
        let patched = patcher.patch(config)?;
        if patched {
            report.patched_runs.push(config.name.clone());
        }
        if patched || setup_ide {
            store.save(config)?;
        }
    }

    Ok(report)
}

/// Register each platform on a fresh builder, in order, and freeze the result.
pub fn configure_platforms(
    settings: &ArchitecturySettings,
    engine: &mut dyn BuildEngine,
    platforms: &[Platform],
) -> ArchitectResult<TransformPlan> {
    let mut builder = TransformPlanBuilder::new(settings.clone());
    for &platform in platforms {
        let extra = extra_steps(settings, platform);
        builder.register(engine, platform, |registration| {
            for step in extra {
                registration.add(step);
            }
        })?;
    }
    Ok(builder.freeze())
}

fn extra_steps(settings: &ArchitecturySettings, platform: Platform) -> Vec<TransformStep> {
    settings
        .extra_steps
        .get(&platform)
        .map(|classes| {
            classes
                .iter()
                .map(|class| TransformStep::from_class_name(class))
                .collect()
        })
        .unwrap_or_default()
}

/// Steps for `platform` without touching a build graph.
pub fn registration_for(settings: &ArchitecturySettings, platform: Platform) -> TransformRegistration {
    let mut registration = TransformRegistration::new(platform);
    match platform {
        Platform::Fabric => registration.setup_fabric_steps(),
        Platform::Forge => registration.setup_forge_steps(),
    }
    for step in extra_steps(settings, platform) {
        registration.add(step);
    }
    registration
}

/// Configure common packaging and persist the SRG request for the toolchain.
pub fn common(project_dir: &Path, forge_enabled: Option<bool>) -> ArchitectResult<CommonReport> {
    let mut ctx = ProjectContext::load(project_dir)?;
    if let Some(forge_enabled) = forge_enabled {
        ctx.settings.common.forge_enabled = forge_enabled;
    }
    let mut graph = ctx.graph()?;

    let setup =
        ProductionPackager::new(&ctx.settings).setup_common(&mut graph, &ctx.settings.common)?;

    if setup.generate_srg_tiny {
        let toolchain = ctx.settings.toolchain.get_or_insert_with(Default::default);
        if !toolchain.generate_srg_tiny {
            toolchain.generate_srg_tiny = true;
            ctx.settings.save(&ctx.dir)?;
            info!("requested SRG tiny mappings from the toolchain");
        }
    }

    Ok(CommonReport {
        production_tasks: setup.production_tasks,
        placeholders: setup.placeholders,
        generate_srg_tiny: setup.generate_srg_tiny,
    })
}

/// Produce the `transformProduction<Platform>` jar with the JVM transformer.
pub fn transform_production(
    project_dir: &Path,
    platform: Platform,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> ArchitectResult<TransformReport> {
    let ctx = ProjectContext::load(project_dir)?;
    let mut graph = ctx.graph()?;
    ProductionPackager::new(&ctx.settings).setup_common(&mut graph, &ctx.settings.common)?;

    let runtime = MavenArtifact::parse(&ctx.settings.transformer_coordinate("runtime"))?;
    let mut classpath = vec![graph.repository().require(&runtime)?];
    classpath.extend(graph.resolve(transformer_classpath_config(&graph))?);
    let transformer = JavaTransformerProcess::new(find_java_binary()?, classpath);

    run_production_transform(&ctx, &graph, platform, input, output, &transformer)
}

fn transformer_classpath_config(engine: &dyn BuildEngine) -> &'static str {
    if engine.has_configuration(TRANSFORMER_CLASSPATH) {
        TRANSFORMER_CLASSPATH
    } else {
        COMPILE_CLASSPATH
    }
}

fn run_production_transform(
    ctx: &ProjectContext,
    graph: &ProjectGraph,
    platform: Platform,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    transformer: &dyn ExternalTransformer,
) -> ArchitectResult<TransformReport> {
    let production = platform.production_name();
    let input = input
        .or_else(|| graph.archive_file(JAR_TASK))
        .ok_or_else(|| ArchitectError::Other("jar task has no archive".into()))?;
    let output = output
        .or_else(|| graph.archive_file(&production))
        .ok_or_else(|| {
            ArchitectError::Other(format!("{} is not configured for this project", production))
        })?;

    let registration = registration_for(&ctx.settings, platform);
    let toolchain = ctx.toolchain();
    let properties = production_properties(ctx, graph, toolchain.as_ref(), platform)?;

    let refmap_added_to = ProductionPackager::new(&ctx.settings).transform_production(
        &registration,
        &input,
        &output,
        transformer,
        &properties,
    )?;

    Ok(TransformReport {
        platform,
        input,
        output,
        steps: registration.steps().iter().map(TransformStep::class_name).collect(),
        refmap_added_to,
    })
}

fn production_properties(
    ctx: &ProjectContext,
    graph: &ProjectGraph,
    toolchain: Option<&StaticToolchain>,
    platform: Platform,
) -> ArchitectResult<RuntimeProperties> {
    PropertySources {
        engine: graph,
        toolchain: toolchain.map(|t| t as &dyn MappingsProvider),
        inject_injectables: ctx.settings.inject_injectables,
        unique_identifier: ctx.unique_identifier()?,
    }
    .collect(platform)
}

/// Add the common marker to `archive`, or to the `remapJar` output.
pub fn mark_common(project_dir: &Path, archive: Option<PathBuf>) -> ArchitectResult<bool> {
    let ctx = ProjectContext::load(project_dir)?;
    let packager = ProductionPackager::new(&ctx.settings);

    if let Some(archive) = archive {
        return Ok(packager.add_common_marker(&archive));
    }

    let mut graph = ctx.graph()?;
    packager.configure_remap_jar(&mut graph);
    let target = graph
        .archive_file(REMAP_JAR_TASK)
        .ok_or_else(|| ArchitectError::Other("remapJar has no archive".into()))?;
    if !target.exists() {
        warn!("{:?} does not exist yet", target);
        return Ok(false);
    }
    packager.run_task_actions(&graph, REMAP_JAR_TASK)
}

/// Run the refmap pass over a jar or an exploded directory.
pub fn add_refmap(target: &Path, refmap_name: &str) -> ArchitectResult<Vec<String>> {
    let pass = AddRefmapName::new(refmap_name);
    if target.is_dir() {
        let mut output = DirectoryOutput::new(target);
        pass.apply(&mut output as &mut dyn ArchiveOutput)
    } else {
        with_jar(target, |jar| pass.apply(jar))
    }
}

/// Refmap name configured for the project, if it has a toolchain.
pub fn project_refmap_name(project_dir: &Path) -> ArchitectResult<Option<String>> {
    let ctx = ProjectContext::load(project_dir)?;
    Ok(ctx.toolchain().map(|t| t.refmap_name()))
}

pub fn steps(settings: &ArchitecturySettings, platform: Platform) -> Vec<StepInfo> {
    registration_for(settings, platform)
        .steps()
        .iter()
        .map(|step| StepInfo {
            id: step.id().to_string(),
            class_name: step.class_name(),
        })
        .collect()
}

/// Download the transformer artifacts and every module dependency.
pub async fn fetch(project_dir: &Path) -> ArchitectResult<FetchReport> {
    let ctx = ProjectContext::load(project_dir)?;
    let graph = ctx.graph()?;
    let settings = &ctx.settings;

    let mut coords = vec![
        settings.transformer_coordinate("runtime"),
        settings.transformer_coordinate("agent"),
    ];
    if settings.inject_injectables {
        coords.push(settings.injectables_coordinate());
        coords.push("net.fabricmc:fabric-loader:+".to_string());
    }
    let mut artifacts = coords
        .iter()
        .map(|c| MavenArtifact::parse(c))
        .collect::<ArchitectResult<Vec<_>>>()?;
    for artifact in graph.module_dependencies() {
        if !artifacts.contains(&artifact) {
            artifacts.push(artifact);
        }
    }

    let resolver = MavenResolver::new(
        settings.repositories.clone(),
        ctx.local_repository(),
        Downloader::new()?,
    );
    let downloaded = resolver.fetch_all(&artifacts).await?;
    Ok(FetchReport {
        requested: artifacts.len(),
        downloaded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::archive::JarArchive;
    use crate::core::launch::{RunConfig, TRANSFORMER_RUNTIME_MAIN};
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const AGENT: &str = "dev.architectury:architectury-transformer:4.0.49:agent";

    fn project(settings: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), settings).unwrap();
        publish(&dir.path().join("repo"), AGENT);
        publish(&dir.path().join("repo"), "dev.architectury:architectury-injectables:1.0.10");
        publish(&dir.path().join("repo"), "net.fabricmc:fabric-loader:0.15.11");
        RunConfigStore::new(dir.path().join("runs"))
            .save(&RunConfig {
                main_class: "net.fabricmc.loader.impl.launch.knot.KnotClient".into(),
                ..RunConfig::default()
            })
            .unwrap();
        dir
    }

    fn publish(repo: &Path, coord: &str) {
        let artifact = MavenArtifact::parse(coord).unwrap();
        let path = repo.join(artifact.local_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, coord.as_bytes()).unwrap();
    }

    fn client_run(dir: &Path) -> RunConfig {
        RunConfigStore::new(dir.join("runs")).load("client").unwrap()
    }

    #[test]
    fn prepare_writes_hand_off_and_patches_runs() {
        let dir = project(
            r#"{ "local_repositories": ["repo"], "platforms": ["fabric"],
                 "toolchain": { "refmap_name": "examplemod-refmap.json" } }"#,
        );

        let report = prepare(dir.path(), &[], true).unwrap();

        assert_eq!(report.platforms, vec![Platform::Fabric]);
        assert_eq!(report.patched_runs, vec!["client"]);
        assert_eq!(report.properties["architectury.platform.name"], "fabric");
        let state = dir.path().join(".gradle/architectury");
        assert!(state.join(".transforms").is_file());
        assert!(state.join(".properties").is_file());
        assert!(state.join("architectury-transformer-agent.jar").is_file());

        let run = client_run(dir.path());
        assert_eq!(run.main_class, TRANSFORMER_RUNTIME_MAIN);
        assert!(run.ide_config_generated);

        // A second prepare leaves the run config alone.
        let again = prepare(dir.path(), &[], false).unwrap();
        assert!(again.patched_runs.is_empty());
        assert_eq!(client_run(dir.path()), run);
    }

    #[test]
    fn no_platforms_writes_nothing() {
        let dir = project(r#"{ "local_repositories": ["repo"] }"#);

        let report = prepare(dir.path(), &[], false).unwrap();

        assert!(report.platforms.is_empty());
        assert!(!dir.path().join(".gradle").exists());
        assert_eq!(
            client_run(dir.path()).main_class,
            "net.fabricmc.loader.impl.launch.knot.KnotClient"
        );
    }

    #[test]
    fn ide_setup_runs_without_platforms() {
        let dir = project(r#"{ "local_repositories": ["repo"] }"#);

        let report = prepare(dir.path(), &[], true).unwrap();

        assert!(report.platforms.is_empty());
        assert!(report.patched_runs.is_empty());
        assert!(!dir.path().join(".gradle").exists());
        let run = client_run(dir.path());
        assert!(run.ide_config_generated);
        assert_eq!(run.tasks_before_run.len(), 1);
        assert!(run.tasks_before_run[0].ends_with(":classes"));
        assert_eq!(run.main_class, "net.fabricmc.loader.impl.launch.knot.KnotClient");
    }

    #[test]
    fn second_agent_fails_before_any_file_is_written() {
        let dir = project(
            r#"{ "local_repositories": ["repo"],
                 "configurations": { "architecturyJavaAgents": ["libs/other-agent.jar"] } }"#,
        );

        let err = prepare(dir.path(), &[Platform::Forge], false).unwrap_err();

        assert!(matches!(err, ArchitectError::IllegalAgentCount { .. }));
        assert!(err.to_string().starts_with("Illegal Count of Architectury Java Agents!"));
        assert!(!dir.path().join(".gradle").exists());
    }

    #[test]
    fn extra_steps_follow_builtin_ones() {
        let settings: ArchitecturySettings = serde_json::from_str(
            r#"{ "extra_steps": { "fabric": ["com.example.Strip",
                 "dev.architectury.transformer.transformers.RemapInjectables"] } }"#,
        )
        .unwrap();

        let listed = steps(&settings, Platform::Fabric);
        assert_eq!(listed.len(), 6);
        assert_eq!(listed[0].id, "detect-refmap");
        assert_eq!(listed[5].class_name, "com.example.Strip");
    }

    #[test]
    fn common_requests_srg_mappings_once() {
        let dir = project(r#"{ "local_repositories": ["repo"] }"#);

        let report = common(dir.path(), None).unwrap();
        assert!(report.generate_srg_tiny);
        assert_eq!(report.placeholders.len(), 2);

        let saved = ArchitecturySettings::load_or_default(dir.path()).unwrap();
        assert!(saved.toolchain.unwrap().generate_srg_tiny);

        let fabric_only = project(r#"{ "local_repositories": ["repo"] }"#);
        let report = common(fabric_only.path(), Some(false)).unwrap();
        assert_eq!(report.production_tasks, vec!["transformProductionFabric"]);
        assert!(ArchitecturySettings::load_or_default(fabric_only.path())
            .unwrap()
            .toolchain
            .is_none());
    }

    struct CopyTransformer;

    impl ExternalTransformer for CopyTransformer {
        fn transform(
            &self,
            input: &Path,
            output: &Path,
            _steps: &[TransformStep],
            _properties: &RuntimeProperties,
        ) -> ArchitectResult<()> {
            std::fs::copy(input, output).map_err(|e| ArchitectError::io(input, e))?;
            Ok(())
        }
    }

    #[test]
    fn production_transform_defaults_to_task_archives() {
        let dir = project(
            r#"{ "local_repositories": ["repo"], "archives_base_name": "examplemod",
                 "toolchain": { "refmap_name": "examplemod-refmap.json" } }"#,
        );
        let ctx = ProjectContext::load(dir.path()).unwrap();
        let mut graph = ctx.graph().unwrap();
        ProductionPackager::new(&ctx.settings)
            .setup_common(&mut graph, &ctx.settings.common)
            .unwrap();

        let dev_jar = graph.archive_file(JAR_TASK).unwrap();
        std::fs::create_dir_all(dev_jar.parent().unwrap()).unwrap();
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&dev_jar).unwrap());
        writer
            .start_file("examplemod.mixins.json", SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(br#"{"package":"com.example.mixin","mixins":["M"]}"#)
            .unwrap();
        writer.finish().unwrap();

        let report =
            run_production_transform(&ctx, &graph, Platform::Fabric, None, None, &CopyTransformer)
                .unwrap();

        assert!(report.output.ends_with("examplemod-1.0.0-transformProductionFabric.jar"));
        assert_eq!(report.refmap_added_to, vec!["examplemod.mixins.json"]);
        assert_eq!(report.steps.len(), 5);
        let mut jar = JarArchive::open(&report.output).unwrap();
        assert!(jar.get_file("examplemod.mixins.json").unwrap().is_some());
    }

    #[test]
    fn mark_common_targets_remapped_jar() {
        let dir = project(r#"{ "archives_base_name": "examplemod" }"#);
        assert!(!mark_common(dir.path(), None).unwrap());

        let remapped = dir.path().join("build/libs/examplemod-1.0.0.jar");
        std::fs::create_dir_all(remapped.parent().unwrap()).unwrap();
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&remapped).unwrap());
        writer.start_file("a.class", SimpleFileOptions::default()).unwrap();
        writer.finish().unwrap();

        assert!(mark_common(dir.path(), None).unwrap());
        let mut jar = JarArchive::open(&remapped).unwrap();
        assert!(jar
            .get_file(crate::core::packaging::COMMON_MARKER)
            .unwrap()
            .is_some());
    }

    fn remapped_jar(dir: &Path) -> PathBuf {
        let remapped = dir.join("build/libs/examplemod-1.0.0.jar");
        std::fs::create_dir_all(remapped.parent().unwrap()).unwrap();
        remapped
    }

    #[test]
    fn mark_common_reports_a_corrupt_remapped_jar() {
        let dir = project(r#"{ "archives_base_name": "examplemod" }"#);
        let remapped = remapped_jar(dir.path());
        std::fs::write(&remapped, b"not a zip").unwrap();

        assert!(!mark_common(dir.path(), None).unwrap());
        assert_eq!(std::fs::read(&remapped).unwrap(), b"not a zip");
    }

    #[test]
    fn mark_common_reports_a_disabled_marker() {
        let dir = project(r#"{ "archives_base_name": "examplemod", "add_common_marker": false }"#);
        let remapped = remapped_jar(dir.path());
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&remapped).unwrap());
        writer.start_file("a.class", SimpleFileOptions::default()).unwrap();
        writer.finish().unwrap();

        assert!(!mark_common(dir.path(), None).unwrap());
        let mut jar = JarArchive::open(&remapped).unwrap();
        assert!(jar
            .get_file(crate::core::packaging::COMMON_MARKER)
            .unwrap()
            .is_none());
    }

    #[test]
    fn add_refmap_handles_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("m.mixins.json"),
            r#"{"package":"p","client":["C"]}"#,
        )
        .unwrap();

        assert_eq!(add_refmap(dir.path(), "r.json").unwrap(), vec!["m.mixins.json"]);
        assert!(add_refmap(dir.path(), "r.json").unwrap().is_empty());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path(), &[Platform::Forge]).unwrap();
        assert!(init(dir.path(), &[]).is_err());

        let settings = ArchitecturySettings::load_or_default(dir.path()).unwrap();
        assert_eq!(settings.platforms, vec![Platform::Forge]);
    }
}
