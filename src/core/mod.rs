// ─── Selene Launcher Core ───
// Sign-in, update, bundle sync and launch pipeline of the Selene client.
//
// Architecture:
//   core/
//     auth/       — PKCE sign-in, token persistence, lazy refresh
//     version/    — Update manifest + per-version metadata cache
//     bundles/    — Server bundle diffing, namespaced hash cache
//     downloader/ — Sequential game file downloads
//     java/       — Platform mapping, Java detection, JRE provisioning
//     launch/     — Classpath builder + launch request
//     native/     — Archive extraction and process spawning
//     servers     — Public server directory
//     state/      — JSON stores, settings, application context

pub mod auth;
pub mod bundles;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod java;
pub mod launch;
pub mod native;
pub mod paths;
pub mod servers;
pub mod state;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;
