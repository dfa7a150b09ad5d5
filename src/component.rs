//! Component lifecycle management
//!
//! Every collaborator the manager owns (providers, the default provider,
//! the replicator) is a [`VfsComponent`]. The manager injects a logger and
//! a [`ProviderContext`], calls `init()` exactly once per instance, and later
//! calls `close()` exactly once per instance during shutdown.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn, Span};

use crate::error::Result;
use crate::manager::ProviderContext;

/// Lifecycle hooks for a collaborator owned by the manager
///
/// All hooks have no-op defaults, so a collaborator that needs no setup
/// or teardown only has to name the trait.
pub trait VfsComponent: Send + Sync {
    /// Receive the logger (a span) this component should log under
    fn set_logger(&self, _logger: Span) {}

    /// Receive the shared provider context
    fn set_context(&self, _context: ProviderContext) {}

    /// Initialise the component. Called after the logger and context are set.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Release resources held by the component
    ///
    /// Errors are logged by the manager and never propagated.
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Storage for the logger and context handed to a component
///
/// Components embed this and forward `set_logger`/`set_context` to it.
#[derive(Default)]
pub struct ComponentBase {
    logger: RwLock<Option<Span>>,
    context: RwLock<Option<ProviderContext>>,
}

impl ComponentBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_logger(&self, logger: Span) {
        *self.logger.write() = Some(logger);
    }

    pub fn set_context(&self, context: ProviderContext) {
        *self.context.write() = Some(context);
    }

    /// The injected logger, or a disabled span before injection
    pub fn logger(&self) -> Span {
        self.logger.read().clone().unwrap_or_else(Span::none)
    }

    /// The injected context, if any
    pub fn context(&self) -> Option<ProviderContext> {
        self.context.read().clone()
    }
}

/// Identity of a component instance, independent of the trait object's vtable
fn component_addr(component: &Arc<dyn VfsComponent>) -> *const () {
    Arc::as_ptr(component) as *const ()
}

/// The distinct components owned by a manager, in registration order
#[derive(Default)]
pub struct ComponentSet {
    components: Vec<Arc<dyn VfsComponent>>,
}

impl ComponentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this exact instance is already owned
    pub fn contains(&self, component: &Arc<dyn VfsComponent>) -> bool {
        let addr = component_addr(component);
        self.components.iter().any(|c| component_addr(c) == addr)
    }

    /// Take ownership of a component, initialising it if it is new
    ///
    /// Returns `true` if the component was initialised by this call and
    /// `false` if it was already owned. A failed `init()` leaves the set
    /// unchanged.
    pub fn setup(
        &mut self,
        component: Arc<dyn VfsComponent>,
        logger: &Span,
        context: &ProviderContext,
    ) -> Result<bool> {
        if self.contains(&component) {
            return Ok(false);
        }

        component.set_logger(logger.clone());
        component.set_context(context.clone());
        component.init()?;

        self.components.push(component);
        debug!("Component initialised ({} owned)", self.components.len());
        Ok(true)
    }

    /// Close every component in registration order, then `last`, then forget them all
    ///
    /// `last` is skipped during the ordered pass and closed at the end.
    /// Returns the number of close hooks invoked.
    pub fn close_all(&mut self, last: Option<&Arc<dyn VfsComponent>>) -> usize {
        let last_addr = last.map(component_addr);
        let mut closed = 0;

        for component in self.components.drain(..) {
            if Some(component_addr(&component)) == last_addr {
                continue;
            }
            close_component(&component);
            closed += 1;
        }

        if let Some(last) = last {
            close_component(last);
            closed += 1;
        }

        closed
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

fn close_component(component: &Arc<dyn VfsComponent>) {
    if let Err(e) = component.close() {
        warn!("Failed to close component: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VfsError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        name: &'static str,
        inits: AtomicUsize,
        fail_init: bool,
        fail_close: bool,
        journal: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Counting {
        fn new(name: &'static str, journal: Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                inits: AtomicUsize::new(0),
                fail_init: false,
                fail_close: false,
                journal,
            })
        }
    }

    impl VfsComponent for Counting {
        fn init(&self) -> Result<()> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(VfsError::Backend(format!("{} refused", self.name)));
            }
            Ok(())
        }

        fn close(&self) -> Result<()> {
            self.journal.lock().push(self.name);
            if self.fail_close {
                return Err(VfsError::Backend("close failed".to_string()));
            }
            Ok(())
        }
    }

    struct Plain;
    impl VfsComponent for Plain {}

    fn setup(set: &mut ComponentSet, c: Arc<dyn VfsComponent>) -> Result<bool> {
        set.setup(c, &Span::none(), &ProviderContext::detached())
    }

    #[test]
    fn test_setup_initialises_once() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let component = Counting::new("a", journal);
        let mut set = ComponentSet::new();

        assert!(setup(&mut set, component.clone()).unwrap());
        assert!(!setup(&mut set, component.clone()).unwrap());

        assert_eq!(component.inits.load(Ordering::SeqCst), 1);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_failed_init_not_owned() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let component = Arc::new(Counting {
            name: "bad",
            inits: AtomicUsize::new(0),
            fail_init: true,
            fail_close: false,
            journal,
        });
        let mut set = ComponentSet::new();

        assert!(setup(&mut set, component.clone()).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn test_plain_component_is_owned() {
        let mut set = ComponentSet::new();
        assert!(setup(&mut set, Arc::new(Plain)).unwrap());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_close_all_orders_last() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let first = Counting::new("first", journal.clone());
        let second = Counting::new("second", journal.clone());
        let third = Counting::new("third", journal.clone());
        let mut set = ComponentSet::new();

        setup(&mut set, first.clone()).unwrap();
        setup(&mut set, second).unwrap();
        setup(&mut set, third).unwrap();

        let last: Arc<dyn VfsComponent> = first;
        assert_eq!(set.close_all(Some(&last)), 3);
        assert_eq!(*journal.lock(), vec!["second", "third", "first"]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_close_failure_does_not_stop_shutdown() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let failing = Arc::new(Counting {
            name: "failing",
            inits: AtomicUsize::new(0),
            fail_init: false,
            fail_close: true,
            journal: journal.clone(),
        });
        let after = Counting::new("after", journal.clone());
        let mut set = ComponentSet::new();

        setup(&mut set, failing).unwrap();
        setup(&mut set, after).unwrap();

        assert_eq!(set.close_all(None), 2);
        assert_eq!(*journal.lock(), vec!["failing", "after"]);
    }

    #[test]
    fn test_component_base_defaults() {
        let base = ComponentBase::new();
        assert!(base.context().is_none());
        assert!(base.logger().is_disabled());

        base.set_context(ProviderContext::detached());
        assert!(base.context().is_some());
    }
}
