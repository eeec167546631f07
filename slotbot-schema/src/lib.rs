pub mod brp;
pub mod ibooking;
pub mod sats;

pub use brp::{
    BrpBooking, BrpBookingRequest, BrpErrorBody, BrpGroupActivity, BrpLoginRequest, BrpLoginResponse,
    BrpValidateResponse,
};
pub use ibooking::{
    IbookingAck, IbookingBookings, IbookingClass, IbookingLoginResponse, IbookingSchedule,
};
pub use sats::{
    SatsBooking, SatsBookingRequest, SatsBookings, SatsClass, SatsClasses, SatsLoginRequest,
    SatsLoginResponse,
};
