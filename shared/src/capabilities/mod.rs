mod picker;

pub use self::picker::{
    ImageFormat, ImagePicker, MediaType, PickConfig, PickedAsset, PickerError, PickerOperation,
    PickerOutput, PickerResult, MAX_IMAGE_SIZE_BYTES,
};

pub use crux_core::render::Render;
pub use crux_http::{Http, HttpError};
pub use crux_kv::error::KeyValueError;
pub use crux_kv::KeyValue;

// The Effect derive refers to `App` by name.
#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

/// What an HTTP callback receives. Non-2xx replies may arrive on either side.
pub type HttpResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

/// What a key-value callback receives: the stored (or previous) value.
pub type KvResult = Result<Option<Vec<u8>>, KeyValueError>;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub picker: ImagePicker<Event>,
    pub render: Render<Event>,
}
