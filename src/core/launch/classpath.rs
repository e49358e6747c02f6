// ─── Classpath Builder ───
// Library jars in manifest order, then the client jar, all from `game_client/`.

use std::path::{Path, PathBuf};

use crate::core::version::VersionMetadata;

pub fn build_classpath(meta: &VersionMetadata, game_dir: &Path) -> Vec<PathBuf> {
    meta.library_urls()
        .map(|(id, _)| id)
        .chain(std::iter::once(meta.file_name.as_str()))
        .map(|name| game_dir.join(name))
        .collect()
}
