use std::collections::HashMap;

use c64patch::{
    remove_protection, Error, MemoryImage, PatchScript, Platform, Result, ScrambleCodec,
    ScrambleWindow,
};
use memmap2::Mmap;
use tracing::info;

use crate::files::Workspace;

/// Where an image is loaded and which part of it is scrambled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub load_address: u16,
    pub codec: ScrambleCodec,
}

impl Layout {
    /// gma6 carries a two byte load address header in front of 0x6A00.
    pub const GMA6: Self = Self {
        load_address: 0x6A00 - 2,
        codec: ScrambleCodec::new(ScrambleWindow::new(0x6A00, 0x6A00 + 0x62D6), 0x49),
    };
}

#[derive(Debug, Clone)]
pub struct Config {
    pub platform: Platform,
    pub layout: Layout,
    pub main_image: String,
    pub protection_image: String,
}

/// Run both pipelines. Both images and every payload are read and checked
/// before the first transform.
pub fn run(workspace: &Workspace, config: &Config, script: &PatchScript) -> Result<()> {
    let main = load_main(workspace, &config.main_image, config.layout, script)?;
    let protection = load_protection(workspace, &config.protection_image, config.platform)?;
    patch_main(workspace, &config.main_image, main, config.layout, script)?;
    patch_protection(workspace, &config.protection_image, protection, config.platform)
}

/// The main code image together with the payloads its script reads.
pub struct MainInput {
    image: MemoryImage,
    blobs: HashMap<String, Mmap>,
}

pub fn load_main(
    workspace: &Workspace,
    name: &str,
    layout: Layout,
    script: &PatchScript,
) -> Result<MainInput> {
    let image = MemoryImage::new(workspace.read(name)?, layout.load_address);
    info!("read {} ({} bytes)", name, image.len());

    let window = layout.codec.window;
    if image.range("scramble", window.from(), window.len()).is_err() {
        return Err(Error::Input {
            name: name.to_owned(),
            reason: format!(
                "{} bytes loaded at 0x{:04X} do not cover 0x{:04X}..=0x{:04X}",
                image.len(),
                layout.load_address,
                window.from(),
                window.to()
            ),
        });
    }

    let blobs = script
        .blob_names()
        .map(|blob| workspace.map(blob).map(|mmap| (blob.to_owned(), mmap)))
        .collect::<Result<HashMap<_, _>>>()?;
    Ok(MainInput { image, blobs })
}

/// Decrypt, patch and re-encrypt the main code image, saving it after each
/// stage.
pub fn patch_main(
    workspace: &Workspace,
    name: &str,
    input: MainInput,
    layout: Layout,
    script: &PatchScript,
) -> Result<()> {
    let MainInput { mut image, blobs } = input;

    layout.codec.decrypt(&mut image)?;
    workspace.write(&format!("{name}.decrypted"), image.as_bytes())?;

    script.apply(&mut image, &blobs)?;
    workspace.write(&format!("{name}.modified"), image.as_bytes())?;

    layout.codec.encrypt(&mut image)?;
    workspace.write(&format!("{name}.encrypted"), image.as_bytes())
}

pub fn load_protection(
    workspace: &Workspace,
    name: &str,
    platform: Platform,
) -> Result<MemoryImage> {
    let bytes = workspace.read(name)?;
    info!("read {} ({} bytes)", name, bytes.len());
    if bytes.len() < platform.required_len() {
        return Err(Error::Input {
            name: name.to_owned(),
            reason: format!(
                "{} bytes, {} protection needs at least {}",
                bytes.len(),
                platform,
                platform.required_len()
            ),
        });
    }
    Ok(MemoryImage::new(bytes, 0))
}

pub fn patch_protection(
    workspace: &Workspace,
    name: &str,
    mut image: MemoryImage,
    platform: Platform,
) -> Result<()> {
    remove_protection(&mut image, platform)?;
    workspace.write(&format!("{name}.modified"), image.as_bytes())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use c64patch::{hash::fnv1a, Patch};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use tempfile::TempDir;

    use super::*;
    use crate::catalogue;

    struct Scratch {
        _dir: TempDir,
        workspace: Workspace,
    }

    impl Scratch {
        fn new() -> Self {
            let dir = tempfile::Builder::new().prefix("c64patch-").tempdir().unwrap();
            let workspace = Workspace::new(dir.path());
            Self {
                _dir: dir,
                workspace,
            }
        }

        fn file(&self, name: &str, bytes: &[u8]) {
            fs::write(self.workspace.root().join(name), bytes).unwrap();
        }

        fn output(&self, name: &str) -> Vec<u8> {
            fs::read(self.workspace.root().join(name)).unwrap()
        }
    }

    fn config(platform: Platform) -> Config {
        Config {
            platform,
            layout: Layout::GMA6,
            main_image: "gma6".to_owned(),
            protection_image: "gma1".to_owned(),
        }
    }

    /// A random gma6 that ends where the helper routines get appended, plus
    /// every payload the catalogue names.
    fn fixture(seed: u64) -> Scratch {
        let mut rng = StdRng::seed_from_u64(seed);
        let scratch = Scratch::new();

        let mut gma6 = vec![0u8; (0xCCE0 - Layout::GMA6.load_address) as usize];
        rng.fill(&mut gma6[..]);
        scratch.file("gma6", &gma6);
        scratch.file("gma1", &[0x00; 0x100]);
        for (n, name) in catalogue::gma6().blob_names().enumerate() {
            scratch.file(name, &vec![n as u8 + 1; 8]);
        }
        scratch
    }

    #[test]
    fn checkpoints_are_written() {
        let scratch = fixture(1);
        let original = scratch.output("gma6");
        run(&scratch.workspace, &config(Platform::Pal), &catalogue::gma6()).unwrap();

        let decrypted = scratch.output("gma6.decrypted");
        let modified = scratch.output("gma6.modified");
        let encrypted = scratch.output("gma6.encrypted");
        assert_eq!(decrypted.len(), original.len());
        assert_eq!(&decrypted[..2], &original[..2]);
        assert_eq!(modified.len(), original.len() + 8);
        assert_eq!(&modified[original.len()..], &[4; 8]);
        assert_eq!(encrypted.len(), modified.len());

        // Decrypting the final image gives back the patched one.
        let mut image = MemoryImage::new(encrypted, Layout::GMA6.load_address);
        Layout::GMA6.codec.decrypt(&mut image).unwrap();
        assert_eq!(image.as_bytes(), modified.as_slice());

        let gma1 = scratch.output("gma1.modified");
        assert_eq!(&gma1[0x25..0x28], &[0xEA; 3]);
        assert_eq!(gma1[0x2C], 0xD0);
        assert_eq!(gma1.iter().filter(|&&b| b != 0).count(), 4);
    }

    #[test]
    fn empty_script_round_trips() {
        let scratch = fixture(2);
        let script = PatchScript::new();
        let input = load_main(&scratch.workspace, "gma6", Layout::GMA6, &script).unwrap();
        patch_main(&scratch.workspace, "gma6", input, Layout::GMA6, &script).unwrap();
        assert_eq!(scratch.output("gma6.encrypted"), scratch.output("gma6"));
    }

    #[test]
    fn runs_are_deterministic() {
        let first = fixture(3);
        let second = fixture(3);
        for scratch in [&first, &second] {
            run(&scratch.workspace, &config(Platform::Ntsc), &catalogue::gma6()).unwrap();
        }
        for name in ["gma6.encrypted", "gma1.modified"] {
            assert_eq!(fnv1a(&first.output(name)), fnv1a(&second.output(name)));
        }
    }

    #[test]
    fn truncated_main_image_is_rejected_before_decrypt() {
        let scratch = fixture(4);
        scratch.file("gma6", &[0x00; 0x100]);
        let err = run(&scratch.workspace, &config(Platform::Pal), &catalogue::gma6()).unwrap_err();

        assert!(matches!(err, Error::Input { name, .. } if name == "gma6"));
        assert!(!scratch.workspace.root().join("gma6.decrypted").exists());
    }

    #[test]
    fn missing_payload_is_rejected_before_decrypt() {
        let scratch = fixture(5);
        fs::remove_file(scratch.workspace.root().join("ll78.bin")).unwrap();
        let err = run(&scratch.workspace, &config(Platform::Pal), &catalogue::gma6()).unwrap_err();

        assert!(matches!(err, Error::Input { name, .. } if name == "ll78.bin"));
        assert!(!scratch.workspace.root().join("gma6.decrypted").exists());
        assert!(!scratch.workspace.root().join("gma1.modified").exists());
    }

    #[test]
    fn bounds_error_leaves_no_modified_checkpoint() {
        let scratch = fixture(7);
        let script: PatchScript = [Patch::shift(0xCCD0, 0xCCC0, 0x20)].into_iter().collect();

        let input = load_main(&scratch.workspace, "gma6", Layout::GMA6, &script).unwrap();

        assert!(matches!(
            patch_main(&scratch.workspace, "gma6", input, Layout::GMA6, &script),
            Err(Error::Bounds { .. })
        ));
        assert!(scratch.workspace.root().join("gma6.decrypted").exists());
        assert!(!scratch.workspace.root().join("gma6.modified").exists());
    }

    #[test]
    fn short_protection_image_is_rejected() {
        let scratch = fixture(6);
        scratch.file("gma1", &[0x00; 0x20]);
        let script: PatchScript = [Patch::rts(0x920D)].into_iter().collect();

        assert!(matches!(
            run(&scratch.workspace, &config(Platform::Pal), &script),
            Err(Error::Input { name, .. }) if name == "gma1"
        ));
        assert!(!scratch.workspace.root().join("gma6.decrypted").exists());
    }
}
