use shadow_rs::ShadowBuilder;

fn main() {
    // Build metadata behind `itemhub --version`
    ShadowBuilder::builder()
        .build()
        .expect("Failed to generate build metadata");
}
