/// Failures while turning the scene asset into a playable scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to decode glTF asset: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("required scene node '{0}' is missing")]
    MissingNode(String),

    #[error("mesh '{0}' has a primitive without positions")]
    MissingPositions(String),

    #[error("unsupported image: {0}")]
    Image(String),
}
