fn main() {
    // Service code for the user lookup RPC. Messages are plain prost structs
    // in `src/grpc/proto.rs`, so no .proto file or protoc is involved.
    let user_service = tonic_build::manual::Service::builder()
        .name("User")
        .package("identity.v1")
        .method(
            tonic_build::manual::Method::builder()
                .name("get_user_by_id")
                .route_name("GetUserByID")
                .input_type("crate::grpc::proto::UserRequest")
                .output_type("crate::grpc::proto::UserResponse")
                .codec_path("tonic::codec::ProstCodec")
                .build(),
        )
        .build();

    tonic_build::manual::Builder::new()
        .build_server(true)
        .build_client(true)
        .compile(&[user_service]);
}
