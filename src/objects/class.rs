//! Class descriptors - per-class metadata shared by every instance
//!
//! Design: Created once by linking, shared behind `Arc`, never mutated by the
//! allocator. The only interior mutability is:
//! - the initialization monitor (run the initializer exactly once)
//! - lazily derived array class and mirror caches
//!
//! Classes are never unloaded, so the array-class cache may form `Arc` cycles
//! with its component.

use super::handle::ObjectHandle;
use super::kind::PrimitiveKind;
use super::shape::{ShapeDescriptor, SlotSpec, StorageClass};
use crate::logging::log_class_initialized;
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

static NEXT_CLASS_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    fn next() -> Self {
        Self(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Access flags relevant to allocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessFlags(u16);

impl AccessFlags {
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;

    #[inline]
    pub const fn new(bits: u16) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }
}

/// What a class describes
#[derive(Clone)]
pub enum ClassKind {
    /// Ordinary class, abstract class or interface
    Object,
    /// Array class owning its component type
    Array(Arc<ClassDescriptor>),
    Primitive(PrimitiveKind),
    /// The `void` placeholder; never a valid array component
    Void,
}

/// Static initializer stand-in, run once by the first thread to initialize the class
pub type InitHook = Box<dyn Fn(&ClassDescriptor) + Send + Sync>;

pub struct ClassDescriptor {
    id: ClassId,
    name: Box<str>,
    kind: ClassKind,
    access: AccessFlags,
    superclass: Option<Arc<ClassDescriptor>>,
    instance_shape: ShapeDescriptor,
    static_shape: ShapeDescriptor,
    defining_loader: ObjectHandle,
    module: ObjectHandle,
    init: InitMonitor,
    array_class: OnceCell<Arc<ClassDescriptor>>,
    pub(crate) mirror: OnceCell<ObjectHandle>,
}

impl ClassDescriptor {
    /// Primitive class (`int`, `boolean`, ...)
    pub fn primitive(kind: PrimitiveKind) -> Arc<Self> {
        Arc::new(Self::synthetic(kind.name(), ClassKind::Primitive(kind)))
    }

    /// The `void` placeholder class
    pub fn void() -> Arc<Self> {
        Arc::new(Self::synthetic("void", ClassKind::Void))
    }

    fn synthetic(name: &str, kind: ClassKind) -> Self {
        Self {
            id: ClassId::next(),
            name: name.into(),
            kind,
            access: AccessFlags::new(AccessFlags::ABSTRACT),
            superclass: None,
            instance_shape: ShapeDescriptor::empty(StorageClass::Instance),
            static_shape: ShapeDescriptor::empty(StorageClass::Static),
            defining_loader: ObjectHandle::null(),
            module: ObjectHandle::null(),
            init: InitMonitor::initialized(),
            array_class: OnceCell::new(),
            mirror: OnceCell::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> &ClassKind {
        &self.kind
    }

    #[inline]
    pub fn access(&self) -> AccessFlags {
        self.access
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self.kind, ClassKind::Array(_))
    }

    /// True for primitive classes and `void`
    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, ClassKind::Primitive(_) | ClassKind::Void)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        matches!(self.kind, ClassKind::Void)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        self.access.contains(AccessFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.access.contains(AccessFlags::INTERFACE)
    }

    /// Plain object class (not array, not primitive)
    #[inline]
    pub fn is_object_class(&self) -> bool {
        matches!(self.kind, ClassKind::Object)
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            ClassKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Component type of an array class
    pub fn component(&self) -> Option<&Arc<ClassDescriptor>> {
        match &self.kind {
            ClassKind::Array(component) => Some(component),
            _ => None,
        }
    }

    /// Number of array levels (`int[][]` has 2, `Object` has 0)
    pub fn dimensions(&self) -> usize {
        let mut depth = 0;
        let mut current = self.component();
        while let Some(component) = current {
            depth += 1;
            current = component.component();
        }
        depth
    }

    #[inline]
    pub fn superclass(&self) -> Option<&Arc<ClassDescriptor>> {
        self.superclass.as_ref()
    }

    #[inline]
    pub fn instance_shape(&self) -> &ShapeDescriptor {
        &self.instance_shape
    }

    #[inline]
    pub fn static_shape(&self) -> &ShapeDescriptor {
        &self.static_shape
    }

    #[inline]
    pub fn defining_loader(&self) -> &ObjectHandle {
        &self.defining_loader
    }

    /// Guest module object; null while the class sits in a not-yet-defined module
    #[inline]
    pub fn module(&self) -> &ObjectHandle {
        &self.module
    }

    /// Array class whose component is `self`, derived once and cached
    pub fn array_class(self: &Arc<Self>) -> Arc<ClassDescriptor> {
        self.array_class
            .get_or_init(|| {
                Arc::new(Self {
                    id: ClassId::next(),
                    name: format!("{}[]", self.name).into_boxed_str(),
                    kind: ClassKind::Array(Arc::clone(self)),
                    access: AccessFlags::new(AccessFlags::ABSTRACT),
                    superclass: None,
                    instance_shape: ShapeDescriptor::empty(StorageClass::Instance),
                    static_shape: ShapeDescriptor::empty(StorageClass::Static),
                    defining_loader: self.defining_loader.clone(),
                    module: self.module.clone(),
                    init: InitMonitor::initialized(),
                    array_class: OnceCell::new(),
                    mirror: OnceCell::new(),
                })
            })
            .clone()
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.init.is_done()
    }

    /// Initialization ran and panicked (directly or in a superclass)
    pub fn is_initialization_failed(&self) -> bool {
        *self.init.state.lock() == InitState::Erroneous
    }

    /// Run class initialization if nobody has yet.
    ///
    /// First caller runs it (superclass first), concurrent callers block until it
    /// completes, and a re-entrant call from the initializing thread returns at once.
    ///
    /// # Panics
    ///
    /// If the initializer panics, the class becomes erroneous: the panic
    /// propagates to the initializing thread, and every waiting or later caller
    /// panics as well instead of seeing a half-initialized class.
    pub fn ensure_initialized(&self) {
        if self.init.is_done() {
            return;
        }
        if !self.init.begin(&self.name) {
            return;
        }

        let attempt = InitAttempt { monitor: &self.init };
        if let Some(superclass) = &self.superclass {
            superclass.ensure_initialized();
        }
        if let Some(hook) = &self.init.hook {
            hook(self);
        }

        attempt.complete();
        log_class_initialized(&self.name);
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dimensions", &self.dimensions())
            .finish()
    }
}

impl PartialEq for ClassDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ClassDescriptor {}

/// Builder standing in for the class-linking subsystem
pub struct ClassBuilder {
    name: String,
    access: AccessFlags,
    superclass: Option<Arc<ClassDescriptor>>,
    fields: Vec<SlotSpec>,
    static_fields: Vec<SlotSpec>,
    defining_loader: ObjectHandle,
    module: ObjectHandle,
    hook: Option<InitHook>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: AccessFlags::default(),
            superclass: None,
            fields: Vec::new(),
            static_fields: Vec::new(),
            defining_loader: ObjectHandle::null(),
            module: ObjectHandle::null(),
            hook: None,
        }
    }

    pub fn abstract_class(mut self) -> Self {
        self.access = AccessFlags::new(self.access.bits() | AccessFlags::ABSTRACT);
        self
    }

    pub fn interface(mut self) -> Self {
        self.access = AccessFlags::new(
            self.access.bits() | AccessFlags::INTERFACE | AccessFlags::ABSTRACT,
        );
        self
    }

    pub fn superclass(mut self, superclass: Arc<ClassDescriptor>) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn field(mut self, slot: SlotSpec) -> Self {
        self.fields.push(slot);
        self
    }

    pub fn static_field(mut self, slot: SlotSpec) -> Self {
        self.static_fields.push(slot);
        self
    }

    pub fn defining_loader(mut self, loader: ObjectHandle) -> Self {
        self.defining_loader = loader;
        self
    }

    pub fn module(mut self, module: ObjectHandle) -> Self {
        self.module = module;
        self
    }

    pub fn on_initialize(mut self, hook: impl Fn(&ClassDescriptor) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn build(self) -> Arc<ClassDescriptor> {
        Arc::new(ClassDescriptor {
            id: ClassId::next(),
            name: self.name.into_boxed_str(),
            kind: ClassKind::Object,
            access: self.access,
            superclass: self.superclass,
            instance_shape: ShapeDescriptor::new(StorageClass::Instance, self.fields),
            static_shape: ShapeDescriptor::new(StorageClass::Static, self.static_fields),
            defining_loader: self.defining_loader,
            module: self.module,
            init: InitMonitor::pending(self.hook),
            array_class: OnceCell::new(),
            mirror: OnceCell::new(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Linked,
    Initializing(ThreadId),
    Initialized,
    /// Initializer panicked; the class can never be used
    Erroneous,
}

/// Class-initialization lock: first caller runs, others wait, owner re-enters
struct InitMonitor {
    done: AtomicBool,
    state: Mutex<InitState>,
    finished: Condvar,
    hook: Option<InitHook>,
}

impl InitMonitor {
    fn pending(hook: Option<InitHook>) -> Self {
        Self {
            done: AtomicBool::new(false),
            state: Mutex::new(InitState::Linked),
            finished: Condvar::new(),
            hook,
        }
    }

    fn initialized() -> Self {
        Self {
            done: AtomicBool::new(true),
            state: Mutex::new(InitState::Initialized),
            finished: Condvar::new(),
            hook: None,
        }
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Returns true if the calling thread must run the initializer
    fn begin(&self, class: &str) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        loop {
            match *state {
                InitState::Initialized => return false,
                InitState::Erroneous => {
                    drop(state);
                    panic!("initialization of {class} failed earlier");
                }
                InitState::Initializing(owner) if owner == me => return false,
                InitState::Initializing(_) => self.finished.wait(&mut state),
                InitState::Linked => {
                    *state = InitState::Initializing(me);
                    return true;
                }
            }
        }
    }

    fn finish(&self) {
        let mut state = self.state.lock();
        *state = InitState::Initialized;
        self.done.store(true, Ordering::Release);
        drop(state);
        self.finished.notify_all();
    }

    fn fail(&self) {
        *self.state.lock() = InitState::Erroneous;
        self.finished.notify_all();
    }
}

/// Marks the class erroneous unless the initializer ran to completion
struct InitAttempt<'a> {
    monitor: &'a InitMonitor,
}

impl InitAttempt<'_> {
    fn complete(self) {
        self.monitor.finish();
        std::mem::forget(self);
    }
}

impl Drop for InitAttempt<'_> {
    fn drop(&mut self) {
        self.monitor.fail();
    }
}
