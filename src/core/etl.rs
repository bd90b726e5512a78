use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<P::Output> {
        let name = self.pipeline.name();
        let started = Instant::now();
        tracing::info!("Starting {}", name);

        tracing::debug!("{}: extracting", name);
        let extracted = self.pipeline.extract().await?;

        tracing::debug!("{}: transforming", name);
        let transformed = self.pipeline.transform(extracted).await?;

        tracing::debug!("{}: loading", name);
        let output = self.pipeline.load(transformed).await?;

        tracing::info!("Finished {} in {:?}", name, started.elapsed());
        Ok(output)
    }
}
