// Sat Oct 17 2026 - Alex

use crate::config::ScanConfig;
use crate::orchestration::worker::scan_module;
use crate::orchestration::{FileLoader, ModuleLoader, ScanError, ScanReport};
use std::any::Any;
use std::thread;

/// Runs one worker thread per configured module and gathers the outcomes in
/// declaration order.
pub struct ScanCoordinator<'c> {
    config: &'c ScanConfig,
    loader: Box<dyn ModuleLoader + 'c>,
}

impl<'c> ScanCoordinator<'c> {
    pub fn new(config: &'c ScanConfig) -> Self {
        Self {
            config,
            loader: Box::new(FileLoader),
        }
    }

    pub fn with_loader(mut self, loader: impl ModuleLoader + 'c) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn module_count(&self) -> usize {
        self.config.modules.len()
    }

    pub fn run(&self) -> ScanReport {
        let loader: &dyn ModuleLoader = self.loader.as_ref();
        log::info!("Starting {} module workers", self.module_count());

        thread::scope(|scope| {
            let workers: Vec<_> = self
                .config
                .modules
                .iter()
                .map(|(module, spec)| (module, scope.spawn(move || scan_module(module, spec, loader))))
                .collect();

            // Joined in declaration order; a panic only fails its own module.
            workers
                .into_iter()
                .map(|(module, worker)| {
                    let outcome = worker.join().unwrap_or_else(|payload| {
                        let message = panic_message(payload.as_ref());
                        log::error!("Worker for {} panicked: {}", module, message);
                        Err(ScanError::Panicked { module: module.clone(), message })
                    });
                    (module.clone(), outcome)
                })
                .collect()
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExportSpec, ModuleSpec, SignatureSpec, DEFAULT_SECTION};
    use crate::memory::{Image, MemoryError};
    use crate::orchestration::ScanFailureKind;
    use crate::utils::testing::ImageBuilder;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    struct SyntheticLoader {
        images: HashMap<String, Vec<u8>>,
        delays: HashMap<String, Duration>,
        poisoned: Vec<String>,
        finished: Mutex<Vec<String>>,
    }

    impl SyntheticLoader {
        fn new() -> Self {
            Self {
                images: HashMap::new(),
                delays: HashMap::new(),
                poisoned: Vec::new(),
                finished: Mutex::new(Vec::new()),
            }
        }

        fn image(mut self, module: &str, marker: u8) -> Self {
            let text = [0x55, 0x8B, 0xEC, marker, 0xC3];
            let bytes = ImageBuilder::new()
                .section(".text", 0x1000, &text)
                .export("Entry", 0x1003)
                .build_mapped();
            self.images.insert(module.to_string(), bytes);
            self
        }

        fn poisoned(mut self, module: &str) -> Self {
            self.poisoned.push(module.to_string());
            self
        }

        fn delay(mut self, module: &str, delay: Duration) -> Self {
            self.delays.insert(module.to_string(), delay);
            self
        }
    }

    impl ModuleLoader for SyntheticLoader {
        fn load(&self, module: &str) -> Result<Image, MemoryError> {
            if let Some(delay) = self.delays.get(module) {
                thread::sleep(*delay);
            }
            if self.poisoned.iter().any(|m| m == module) {
                panic!("loader blew up on {}", module);
            }

            let result = match self.images.get(module) {
                Some(bytes) => Image::from_mapped(bytes.clone()),
                None => Err(MemoryError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    module.to_string(),
                ))),
            };

            self.finished.lock().unwrap().push(module.to_string());
            result
        }
    }

    fn module_spec(signature: &str) -> ModuleSpec {
        let mut spec = ModuleSpec::default();
        spec.signatures.insert(
            "prologue".to_string(),
            SignatureSpec {
                signature: signature.to_string(),
                nth_match: 0,
                padding: 3,
                dereferences: 0,
                section: DEFAULT_SECTION.to_string(),
            },
        );
        spec.exports.insert(
            "entry".to_string(),
            ExportSpec { export: "Entry".to_string(), padding: 0, dereferences: 0 },
        );
        spec
    }

    #[test]
    fn test_report_order_ignores_completion_order() {
        let mut config = ScanConfig::new();
        for module in ["A.dll", "B.dll", "C.dll"] {
            config.modules.insert(module.to_string(), module_spec("55 8B EC"));
        }

        let loader = SyntheticLoader::new()
            .image("A.dll", 1)
            .image("B.dll", 2)
            .image("C.dll", 3)
            .delay("A.dll", Duration::from_millis(150));

        let coordinator = ScanCoordinator::new(&config).with_loader(loader);
        let report = coordinator.run();

        assert_eq!(report.modules().collect::<Vec<_>>(), vec!["A.dll", "B.dll", "C.dll"]);
        for (_, outcome) in report.iter() {
            let offsets = outcome.as_ref().unwrap();
            assert_eq!(offsets["prologue"], 0x1003);
            assert_eq!(offsets["entry"], 0x1003);
        }
    }

    #[test]
    fn test_delayed_module_finishes_last() {
        let mut config = ScanConfig::new();
        for module in ["A.dll", "B.dll"] {
            config.modules.insert(module.to_string(), module_spec("55"));
        }

        let loader = SyntheticLoader::new()
            .image("A.dll", 1)
            .image("B.dll", 2)
            .delay("A.dll", Duration::from_millis(200));

        let coordinator = ScanCoordinator::new(&config).with_loader(&loader);
        let report = coordinator.run();

        assert_eq!(*loader.finished.lock().unwrap(), vec!["B.dll", "A.dll"]);
        assert_eq!(report.modules().collect::<Vec<_>>(), vec!["A.dll", "B.dll"]);
    }

    #[test]
    fn test_failures_stay_in_their_module() {
        let mut config = ScanConfig::new();
        config.modules.insert("missing.dll".to_string(), module_spec("55"));
        config.modules.insert("broken.dll".to_string(), module_spec("CC CC"));
        config.modules.insert("good.dll".to_string(), module_spec("55 8B"));

        let loader = SyntheticLoader::new().image("broken.dll", 4).image("good.dll", 5);
        let report = ScanCoordinator::new(&config).with_loader(loader).run();

        let missing = report.get("missing.dll").unwrap().as_ref().unwrap_err();
        assert_eq!(missing.kind(), ScanFailureKind::Load);

        let broken = report.get("broken.dll").unwrap().as_ref().unwrap_err();
        assert_eq!(broken.kind(), ScanFailureKind::NotFound);
        assert_eq!(broken.entry(), Some("prologue"));

        let good = report.get("good.dll").unwrap().as_ref().unwrap();
        assert_eq!(good.keys().collect::<Vec<_>>(), vec!["prologue", "entry"]);
        assert!(report.has_failures());
    }

    #[test]
    fn test_worker_panic_fails_only_its_module() {
        let mut config = ScanConfig::new();
        for module in ["A.dll", "B.dll", "C.dll"] {
            config.modules.insert(module.to_string(), module_spec("55"));
        }

        let loader = SyntheticLoader::new()
            .image("A.dll", 1)
            .image("B.dll", 2)
            .image("C.dll", 3)
            .poisoned("B.dll");
        let report = ScanCoordinator::new(&config).with_loader(loader).run();

        assert_eq!(report.modules().collect::<Vec<_>>(), vec!["A.dll", "B.dll", "C.dll"]);
        let err = report.get("B.dll").unwrap().as_ref().unwrap_err();
        assert_eq!(err.kind(), ScanFailureKind::Panicked);
        assert_eq!(err.module(), "B.dll");
        assert!(err.to_string().contains("loader blew up on B.dll"));
        assert!(report.get("A.dll").unwrap().is_ok());
        assert!(report.get("C.dll").unwrap().is_ok());
    }

    #[test]
    fn test_file_loader_end_to_end() {
        let builder = ImageBuilder::new().x64().section(".text", 0x1000, &[0x48, 0x89, 0x5C, 0x24, 0x08]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&builder.build_file()).unwrap();

        let module = file.path().to_string_lossy().into_owned();
        let mut spec = ModuleSpec::default();
        spec.signatures.insert(
            "stack".to_string(),
            SignatureSpec {
                signature: "48 89 5C 24 ?".to_string(),
                nth_match: 0,
                padding: 4,
                dereferences: 0,
                section: DEFAULT_SECTION.to_string(),
            },
        );

        let mut config = ScanConfig::new();
        config.modules.insert(module.clone(), spec);

        let report = ScanCoordinator::new(&config).run();
        assert_eq!(report.get(&module).unwrap().as_ref().unwrap()["stack"], 0x1004);
    }
}
