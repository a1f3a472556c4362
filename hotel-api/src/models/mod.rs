//! Resource models
//!
//! Each resource comes as an input bag (`*Fields`), a stored entity, a
//! partial-update body (`*Patch`), a validation function and its list
//! filters.

pub mod guest;
pub mod room;
pub mod room_type;

pub use guest::{
    guest_filters, validate_guest, Guest, GuestFields, GuestPatch, GuestSearch,
    GUEST_DEFAULT_SORT, GUEST_SORT_SAFELIST,
};
pub use room::{
    room_filters, validate_room, Room, RoomFields, RoomPatch, RoomSearch, ROOM_DEFAULT_SORT,
    ROOM_SORT_SAFELIST,
};
pub use room_type::{
    room_type_filters, validate_room_type, RoomType, RoomTypeFields, RoomTypePatch,
    RoomTypeSearch, ROOM_TYPE_DEFAULT_SORT, ROOM_TYPE_SORT_SAFELIST,
};
