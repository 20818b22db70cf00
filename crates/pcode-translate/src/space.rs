use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pcode_sys::api::TranslationContext;
use pcode_sys::sys::{self, SpaceHandle};

/// Identifies the [crate::Session] an entity belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SessionId(usize);

impl SessionId {
    pub fn next() -> Self {
        static NEXT_SESSION_ID: AtomicUsize = AtomicUsize::new(0);
        Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endianness {
    Big,
    Little,
}

impl std::fmt::Display for Endianness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endianness::Big => write!(f, "big"),
            Endianness::Little => write!(f, "little"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressSpaceType {
    /// Special space to represent constants
    Constant,
    /// Normal spaces modelled by processor
    Processor,
    /// addresses = offsets off of base register
    BaseRegister,
    /// Internally managed temporary space
    Internal,
    /// Special internal FuncCallSpecs reference
    FuncCallSpecs,
    /// Special internal PcodeOp reference
    PcodeOp,
    /// Special virtual space to represent split variables
    Join,
}

impl From<sys::SpaceType> for AddressSpaceType {
    fn from(space_type: sys::SpaceType) -> Self {
        match space_type {
            sys::SpaceType::IPTR_CONSTANT => Self::Constant,
            sys::SpaceType::IPTR_PROCESSOR => Self::Processor,
            sys::SpaceType::IPTR_SPACEBASE => Self::BaseRegister,
            sys::SpaceType::IPTR_INTERNAL => Self::Internal,
            sys::SpaceType::IPTR_FSPEC => Self::FuncCallSpecs,
            sys::SpaceType::IPTR_IOP => Self::PcodeOp,
            sys::SpaceType::IPTR_JOIN => Self::Join,
            _ => panic!("Unknown address space type: {space_type:?}"),
        }
    }
}

struct AddrSpaceData {
    handle: SpaceHandle,
    name: String,
    endianness: Endianness,
    space_type: AddressSpaceType,
    session: SessionId,
    index: usize,
}

/// An address space of a [crate::Session].
///
/// Address spaces are interned by their session: every reference to the same engine address
/// space is the same instance. Equality is therefore identity, see [AddrSpace::ptr_eq].
#[derive(Clone)]
pub struct AddrSpace(Rc<AddrSpaceData>);

impl AddrSpace {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn endianness(&self) -> Endianness {
        self.0.endianness
    }

    pub fn is_big_endian(&self) -> bool {
        self.0.endianness == Endianness::Big
    }

    pub fn space_type(&self) -> AddressSpaceType {
        self.0.space_type
    }

    pub fn is_constant(&self) -> bool {
        self.0.space_type == AddressSpaceType::Constant
    }

    /// The engine handle of this address space
    pub fn handle(&self) -> SpaceHandle {
        self.0.handle
    }

    /// Returns true if both refer to the identical instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn session(&self) -> SessionId {
        self.0.session
    }

    fn key(&self) -> (SessionId, usize) {
        (self.0.session, self.0.index)
    }
}

impl PartialEq for AddrSpace {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for AddrSpace {}

impl std::hash::Hash for AddrSpace {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl Ord for AddrSpace {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for AddrSpace {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Debug for AddrSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddrSpace")
            .field("name", &self.0.name)
            .field("handle", &self.0.handle)
            .field("space_type", &self.0.space_type)
            .field("endianness", &self.0.endianness)
            .finish()
    }
}

impl std::fmt::Display for AddrSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

#[derive(Default)]
struct SpaceArena {
    spaces: Vec<AddrSpace>,
    by_handle: HashMap<SpaceHandle, usize>,
}

/// Interns the address spaces of a session, keyed by engine handle. Spaces are created on first
/// sighting and live as long as the registry.
pub(crate) struct SpaceRegistry {
    session: SessionId,
    arena: RefCell<SpaceArena>,
}

impl SpaceRegistry {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            arena: Default::default(),
        }
    }

    /// Number of address spaces seen so far
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.arena.borrow().spaces.len()
    }

    pub fn resolve(&self, context: &impl TranslationContext, handle: SpaceHandle) -> AddrSpace {
        if let Some(space) = self.lookup(handle) {
            return space;
        }

        // Query the engine before borrowing the arena mutably
        let name = context.space_name(handle);
        let endianness = if context.is_big_endian(handle) {
            Endianness::Big
        } else {
            Endianness::Little
        };
        let space_type = context.space_type(handle).into();

        let mut arena = self.arena.borrow_mut();
        let index = arena.spaces.len();
        let space = AddrSpace(Rc::new(AddrSpaceData {
            handle,
            name,
            endianness,
            space_type,
            session: self.session,
            index,
        }));

        log::trace!(
            "session {session}: registered address space {space:?}",
            session = self.session
        );

        arena.spaces.push(space.clone());
        arena.by_handle.insert(handle, index);
        space
    }

    fn lookup(&self, handle: SpaceHandle) -> Option<AddrSpace> {
        let arena = self.arena.borrow();
        arena
            .by_handle
            .get(&handle)
            .map(|&index| arena.spaces[index].clone())
    }
}
