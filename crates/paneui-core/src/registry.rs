use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::driver::Driver;
use crate::error::{DriverResult, RegistryError};

/// Zero-argument constructor of a driver.
pub type DriverFactory = Arc<dyn Fn() -> DriverResult<Box<dyn Driver>> + Send + Sync>;

/// Name -> factory table.
///
/// Backends register themselves into it once at startup; the UI facade
/// resolves driver names through it. Entries are overwritten, never removed.
///
/// The lock only guards the map. Factories run outside of it, so a backend
/// blocking on a slow display connection does not stall other lookups.
#[derive(Default)]
pub struct DriverRegistry {
    factories: Mutex<HashMap<String, DriverFactory>>,
}

impl DriverRegistry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous registration.
    pub fn set<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> DriverResult<Box<dyn Driver>> + Send + Sync + 'static,
    {
        let name = name.into();
        log::debug!("registry: set driver '{name}'");
        self.factories.lock().insert(name, Arc::new(factory));
    }

    /// Constructs a driver through the factory registered under `name`.
    pub fn get(&self, name: &str) -> Result<Box<dyn Driver>, RegistryError> {
        let factory = self.factories.lock().get(name).cloned();
        let Some(factory) = factory else {
            return Err(RegistryError::DriverNotFound { name: name.to_string() });
        };

        factory().map_err(|source| RegistryError::Factory {
            name: name.to_string(),
            source,
        })
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.lock().contains_key(name)
    }

    /// Snapshot of the registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{NativeWindow, WindowRequest};
    use crate::error::DriverError;
    use crate::surface::Surface;
    use std::any::Any;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NamedDriver(&'static str);

    impl Driver for NamedDriver {
        fn name(&self) -> &str {
            self.0
        }

        fn create_window(&mut self, _: WindowRequest<'_>) -> DriverResult<Box<dyn NativeWindow>> {
            Err(DriverError::WindowCreationFailed("test driver".into()))
        }

        fn create_surface(&mut self, _: u32, _: u32) -> DriverResult<Box<dyn Surface>> {
            Err(DriverError::SurfaceCreationFailed("test driver".into()))
        }

        fn release(&mut self) -> DriverResult<()> {
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn unknown_name_is_not_found() {
        let reg = DriverRegistry::new();
        reg.set("a", || Ok(Box::new(NamedDriver("a")) as Box<dyn Driver>));

        for name in ["", "b", "A", "a "] {
            match reg.get(name) {
                Err(RegistryError::DriverNotFound { name: n }) => assert_eq!(n, name),
                other => panic!("expected not found for {name:?}, got ok={}", other.is_ok()),
            }
        }
    }

    #[test]
    fn get_invokes_factory_each_time() {
        let reg = DriverRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        reg.set("counted", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(NamedDriver("counted")) as Box<dyn Driver>)
        });

        assert_eq!(reg.get("counted").unwrap().name(), "counted");
        assert_eq!(reg.get("counted").unwrap().name(), "counted");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn set_overwrites_previous_factory() {
        let reg = DriverRegistry::new();
        reg.set("x", || Ok(Box::new(NamedDriver("first")) as Box<dyn Driver>));
        reg.set("x", || Ok(Box::new(NamedDriver("second")) as Box<dyn Driver>));

        assert_eq!(reg.get("x").unwrap().name(), "second");
        assert_eq!(reg.list(), vec!["x".to_string()]);
    }

    #[test]
    fn factory_error_is_passed_through() {
        let reg = DriverRegistry::new();
        reg.set("broken", || Err(DriverError::Connection("refused".into())));

        match reg.get("broken") {
            Err(RegistryError::Factory { name, source: DriverError::Connection(msg) }) => {
                assert_eq!(name, "broken");
                assert_eq!(msg, "refused");
            }
            other => panic!("unexpected result, ok={}", other.is_ok()),
        }
    }

    #[test]
    fn list_returns_exactly_registered_names() {
        let reg = DriverRegistry::new();
        for name in ["c", "a", "b"] {
            reg.set(name, move || Ok(Box::new(NamedDriver(name)) as Box<dyn Driver>));
        }

        let got: HashSet<String> = reg.list().into_iter().collect();
        let want: HashSet<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn factory_may_use_registry_without_deadlock() {
        let reg = Arc::new(DriverRegistry::new());
        reg.set("inner", || Ok(Box::new(NamedDriver("inner")) as Box<dyn Driver>));

        let r = reg.clone();
        reg.set("outer", move || r.get("inner").map_err(|e| DriverError::Connection(e.to_string())));

        assert_eq!(reg.get("outer").unwrap().name(), "inner");
    }

    #[test]
    fn concurrent_set_and_list() {
        let reg = Arc::new(DriverRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reg = reg.clone();
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let name = format!("d{i}-{j}");
                        reg.set(name, || Err(DriverError::Released));
                        let _ = reg.list();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.list().len(), 8 * 50);
    }
}
