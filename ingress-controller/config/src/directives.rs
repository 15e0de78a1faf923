pub mod api_key;
pub mod headers;
pub mod listen;
pub mod location;

pub use self::{
    api_key::build_header_query_value,
    headers::{
        build_merged_proxy_set_headers, build_proxy_set_headers, parse_proxy_set_headers,
        HeaderError, ProxySetHeader,
    },
    listen::{build_listener_block, build_stream_listen, ListenerKind},
    location::{apply_regex_modifier, build_location_path, RegexModifier},
};
