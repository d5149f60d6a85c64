//! Generated protobuf/tonic bindings for `costsource.v1`, built once
//! here so the server and client crates codegen against the same
//! `.proto` (spec.md §4.6 RPC surface).

pub mod costsource {
    tonic::include_proto!("costsource.v1");

    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("costsource_descriptor");
}
