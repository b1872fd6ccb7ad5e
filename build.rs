use tonic_build::manual::{Builder, Method, Service};

const CODEC: &str = "tonic_prost::ProstCodec";

fn unary(name: &str, route: &str, input: &str, output: &str) -> Method {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::rpc::proto::{input}"))
        .output_type(format!("crate::rpc::proto::{output}"))
        .codec_path(CODEC)
        .build()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let bank = Service::builder()
        .name("Bank")
        .package("bank")
        .method(unary("deposit", "Deposit", "LedgerRequest", "Empty"))
        .method(unary("withdraw", "Withdraw", "LedgerRequest", "Empty"))
        .method(unary("add_interest", "AddInterest", "LedgerRequest", "Empty"))
        .build();

    let calculator = Service::builder()
        .name("Calculator")
        .package("calculator")
        .method(unary("add", "Add", "IntRequest", "IntResponse"))
        .method(unary("sub", "Sub", "IntRequest", "IntResponse"))
        .method(unary("mult", "Mult", "IntRequest", "IntResponse"))
        .method(unary("div", "Div", "IntRequest", "FloatResponse"))
        .build();

    Builder::new().compile(&[bank, calculator]);
}
