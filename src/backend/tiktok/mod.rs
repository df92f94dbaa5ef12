mod relay;

pub use relay::{decode_frame, RelayUpdate, TiktokRelaySource};
