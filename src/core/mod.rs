// ─── Architect Core ───
// Transform configuration and runtime hand-off between a build graph and
// the Architectury bytecode transformer.
//
// Architecture:
//   core/
//     platform/     — Platforms, transform steps, registration builder + frozen plan
//     project/      — Settings, build graph, generated file layout, project id
//     runtime/      — Step manifest + .properties hand-off files
//     launch/       — Run configurations, launch patching, classpath helpers
//     packaging/    — Common packaging, marker, production transform
//     transformers/ — Refmap post-processing of mixin configs
//     archive/      — Jar / directory outputs
//     toolchain/    — Mappings provider contract
//     maven/        — Coordinates, local repositories, remote metadata
//     downloader/   — Concurrent downloads with SHA-1 validation
//     java/         — JVM discovery

pub mod archive;
pub mod downloader;
pub mod error;
pub mod http;
pub mod java;
pub mod launch;
pub mod maven;
pub mod packaging;
pub mod platform;
pub mod project;
pub mod runtime;
pub mod toolchain;
pub mod transformers;
