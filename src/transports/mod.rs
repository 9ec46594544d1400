//! Concrete control transport implementations.

mod onvif;

pub use onvif::OnvifTransport;
