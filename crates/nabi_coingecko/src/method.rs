use serde::Serialize;

pub trait Method {
    /// Path under the API base URL, e.g. `/simple/price`.
    const PATH: &'static str;

    type Response: serde::de::DeserializeOwned;
    type Params: Serialize;
}
