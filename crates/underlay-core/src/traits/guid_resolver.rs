// # GUID Resolver Trait
//
// Wraps the low-level system call that maps an interface index to the
// interface's 16-byte GUID. The byte reordering into a canonical
// identifier lives in `crate::identifier`, not here.

use crate::identifier::InterfaceGuid;
use crate::traits::InterfaceIndex;

/// Trait for index → GUID lookups
///
/// # Errors
///
/// Implementations return [`Error::Lookup`](crate::Error::Lookup) when the
/// OS cannot resolve the index, e.g. because the interface was removed
/// between the default-route query and this call.
pub trait GuidResolver: Send + Sync {
    /// Resolve the GUID of the interface with the given index
    fn guid_for_index(&self, index: InterfaceIndex) -> Result<InterfaceGuid, crate::Error>;
}
