use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Pick the extractor from the archive's file name.
pub fn extract_file(archive: &Path, dest_dir: &Path) -> LauncherResult<String> {
    let name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let root = if name.ends_with(".zip") {
        extract_zip(archive, dest_dir)?
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        extract_tar(archive, dest_dir, true)?
    } else if name.ends_with(".tar") {
        extract_tar(archive, dest_dir, false)?
    } else {
        return Err(LauncherError::Extraction {
            archive: archive.to_path_buf(),
            message: format!("Unsupported archive type: {name}"),
        });
    };

    debug!("Extracted {:?} into {:?} (root={:?})", archive, dest_dir, root);
    Ok(root)
}

fn extract_zip(zip_path: &Path, dest_dir: &Path) -> LauncherResult<String> {
    let file = File::open(zip_path).map_err(|source| LauncherError::Io {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
    create_dir(dest_dir)?;

    let mut roots = BTreeSet::new();
    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;
        let rel_path = zipped
            .enclosed_name()
            .ok_or_else(|| LauncherError::Extraction {
                archive: zip_path.to_path_buf(),
                message: format!("Invalid zip entry path: {}", zipped.name()),
            })?;
        if let Some(root) = first_normal_component(&rel_path) {
            roots.insert(root);
        }

        let out_path = dest_dir.join(&rel_path);
        if zipped.is_dir() {
            create_dir(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            create_dir(parent)?;
        }

        let mut out = File::create(&out_path).map_err(|source| LauncherError::Io {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut zipped, &mut out).map_err(|source| LauncherError::Io {
            path: out_path.clone(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = zipped.unix_mode() {
                std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode))
                    .map_err(|source| LauncherError::Io {
                        path: out_path.clone(),
                        source,
                    })?;
            }
        }
    }

    Ok(single_root(roots))
}

fn extract_tar(tar_path: &Path, dest_dir: &Path, gzip: bool) -> LauncherResult<String> {
    let file = File::open(tar_path).map_err(|source| LauncherError::Io {
        path: tar_path.to_path_buf(),
        source,
    })?;
    let reader: Box<dyn Read> = if gzip {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    let mut archive = tar::Archive::new(reader);
    create_dir(dest_dir)?;

    let tar_err = |source: std::io::Error| LauncherError::Extraction {
        archive: tar_path.to_path_buf(),
        message: source.to_string(),
    };

    let mut roots = BTreeSet::new();
    for entry in archive.entries().map_err(tar_err)? {
        let mut entry = entry.map_err(tar_err)?;
        let entry_path = entry.path().map_err(tar_err)?.into_owned();
        if let Some(root) = first_normal_component(&entry_path) {
            roots.insert(root);
        }
        // `unpack_in` refuses entries that would escape `dest_dir`.
        entry.unpack_in(dest_dir).map_err(tar_err)?;
    }

    Ok(single_root(roots))
}

fn first_normal_component(path: &Path) -> Option<String> {
    path.components().find_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy().to_string()),
        _ => None,
    })
}

fn single_root(roots: BTreeSet<String>) -> String {
    if roots.len() == 1 {
        roots.into_iter().next().unwrap_or_default()
    } else {
        String::new()
    }
}

fn create_dir(path: &Path) -> LauncherResult<()> {
    std::fs::create_dir_all(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, body) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap();
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, body) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *body).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn zip_with_single_root_reports_that_root() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("runtime.zip");
        write_zip(
            &archive,
            &[
                ("jdk-21-jre/bin/java", b"#!"),
                ("jdk-21-jre/release", b"JAVA_VERSION=21"),
            ],
        );

        let dest = temp.path().join("out");
        let root = extract_file(&archive, &dest).unwrap();

        assert_eq!(root, "jdk-21-jre");
        assert!(dest.join("jdk-21-jre/bin/java").exists());
    }

    #[test]
    fn zip_with_several_roots_reports_empty_root() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("bundle.zip");
        write_zip(&archive, &[("textures/a.png", b"a"), ("sounds/b.ogg", b"b")]);

        let dest = temp.path().join("abc123");
        let root = extract_file(&archive, &dest).unwrap();

        assert_eq!(root, "");
        assert!(dest.join("textures/a.png").exists());
        assert!(dest.join("sounds/b.ogg").exists());
    }

    #[test]
    fn tar_gz_is_unpacked_and_root_detected() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("OpenJDK21U-jre_x64_linux_hotspot_21.0.8_9.tar.gz");
        write_tar_gz(&archive, &[("jdk-21.0.8+9-jre/bin/java", b"elf")]);

        let dest = temp.path().join("jre");
        let root = extract_file(&archive, &dest).unwrap();

        assert_eq!(root, "jdk-21.0.8+9-jre");
        assert!(dest.join("jdk-21.0.8+9-jre/bin/java").exists());
    }

    #[test]
    fn unknown_extension_is_an_extraction_error() {
        let temp = tempfile::tempdir().unwrap();
        let archive = temp.path().join("runtime.rar");
        std::fs::write(&archive, b"rar").unwrap();

        let err = extract_file(&archive, temp.path()).unwrap_err();
        assert!(matches!(err, LauncherError::Extraction { .. }));
    }
}
