// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Docker implementation of the [`ContainerEngine`] contract via bollard.
//!
//! Data movement runs in throwaway containers: a volume mount and a host
//! bind mount bridged by a tar/cp command. The container is always removed,
//! whatever the run's outcome.

use crate::domain::engine::{
    ContainerEngine, DataMoverSpec, EngineError, VolumeSummary,
};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, RestartContainerOptions, StartContainerOptions,
    StopContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{Mount, MountTypeEnum};
use bollard::volume::{CreateVolumeOptions, ListVolumesOptions, RemoveVolumeOptions};
use bollard::Docker;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, info, warn};

pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect to the local Docker daemon.
    pub fn connect() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| EngineError::Connection(e.to_string()))?;
        Ok(Self { docker })
    }

    /// Verify the daemon is reachable.
    pub async fn healthcheck(&self) -> Result<(), EngineError> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Connection(e.to_string()))
    }

    fn is_not_found(err: &bollard::errors::Error) -> bool {
        matches!(
            err,
            bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }
        )
    }

    async fn ensure_image(&self, image: &str) -> Result<(), EngineError> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }
        self.pull_image(image).await
    }

    async fn collect_logs(&self, container_id: &str) -> String {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut stream = self.docker.logs(container_id, Some(options));
        let mut collected = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                    collected.push_str(&String::from_utf8_lossy(&message));
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        collected
    }

    /// Run a created container to completion, returning its exit status.
    async fn run_to_completion(&self, container_id: &str) -> Result<i64, EngineError> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| EngineError::Api(format!("failed to start data mover: {e}")))?;

        let mut wait = self
            .docker
            .wait_container(container_id, None::<WaitContainerOptions<String>>);

        match wait.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard surfaces a non-zero exit as a wait error carrying the code.
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(EngineError::Api(format!("wait failed: {e}"))),
            None => Err(EngineError::Api("wait stream ended unexpectedly".to_string())),
        }
    }

    fn mover_mounts(spec: &DataMoverSpec) -> Vec<Mount> {
        spec.mounts
            .iter()
            .map(|m| Mount {
                target: Some(m.target.clone()),
                source: Some(m.source.clone()),
                typ: Some(if m.volume {
                    MountTypeEnum::VOLUME
                } else {
                    MountTypeEnum::BIND
                }),
                read_only: Some(m.read_only),
                ..Default::default()
            })
            .collect()
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn list_volumes(&self) -> Result<Vec<VolumeSummary>, EngineError> {
        let response = self
            .docker
            .list_volumes(None::<ListVolumesOptions<String>>)
            .await
            .map_err(|e| EngineError::Api(e.to_string()))?;

        Ok(response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(summarize)
            .collect())
    }

    async fn volume_exists(&self, name: &str) -> Result<bool, EngineError> {
        match self.docker.inspect_volume(name).await {
            Ok(_) => Ok(true),
            Err(e) if Self::is_not_found(&e) => Ok(false),
            Err(e) => Err(EngineError::Api(e.to_string())),
        }
    }

    async fn inspect_volume(&self, name: &str) -> Result<VolumeSummary, EngineError> {
        match self.docker.inspect_volume(name).await {
            Ok(volume) => Ok(summarize(volume)),
            Err(e) if Self::is_not_found(&e) => Err(EngineError::VolumeNotFound(name.to_string())),
            Err(e) => Err(EngineError::Api(e.to_string())),
        }
    }

    async fn create_volume(&self, name: &str) -> Result<(), EngineError> {
        self.docker
            .create_volume(CreateVolumeOptions {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Api(format!("failed to create volume {name}: {e}")))
    }

    async fn remove_volume(&self, name: &str, force: bool) -> Result<(), EngineError> {
        match self
            .docker
            .remove_volume(name, Some(RemoveVolumeOptions { force }))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if Self::is_not_found(&e) => Err(EngineError::VolumeNotFound(name.to_string())),
            Err(e) => Err(EngineError::Api(format!("failed to remove volume {name}: {e}"))),
        }
    }

    async fn volume_in_use(&self, name: &str) -> Result<bool, EngineError> {
        Ok(!self.containers_using(name).await?.is_empty())
    }

    async fn containers_using(&self, name: &str) -> Result<Vec<String>, EngineError> {
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all: true,
                ..Default::default()
            }))
            .await
            .map_err(|e| EngineError::Api(e.to_string()))?;

        let mut using = Vec::new();
        for container in containers {
            let mounts_volume = container
                .mounts
                .iter()
                .flatten()
                .any(|m| m.name.as_deref() == Some(name));
            if !mounts_volume {
                continue;
            }
            if let Some(container_name) = container.names.iter().flatten().next() {
                using.push(container_name.trim_start_matches('/').to_string());
            }
        }
        Ok(using)
    }

    async fn stop_containers(
        &self,
        names: &[String],
        timeout_secs: i64,
    ) -> Result<(), EngineError> {
        for name in names {
            debug!(container = %name, "stopping container");
            self.docker
                .stop_container(name, Some(StopContainerOptions { t: timeout_secs }))
                .await
                .map_err(|e| EngineError::Api(format!("failed to stop {name}: {e}")))?;
        }
        Ok(())
    }

    async fn restart_containers(
        &self,
        names: &[String],
        timeout_secs: i64,
    ) -> Result<(), EngineError> {
        for name in names {
            debug!(container = %name, "restarting container");
            self.docker
                .restart_container(
                    name,
                    Some(RestartContainerOptions { t: timeout_secs as isize }),
                )
                .await
                .map_err(|e| EngineError::Api(format!("failed to restart {name}: {e}")))?;
        }
        Ok(())
    }

    async fn run_data_mover(&self, spec: DataMoverSpec) -> Result<(), EngineError> {
        self.ensure_image(&spec.image).await?;

        let options = CreateContainerOptions {
            name: format!("volman-mover-{}", uuid::Uuid::new_v4()),
            platform: None,
        };
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.command.clone()),
            host_config: Some(bollard::service::HostConfig {
                mounts: Some(Self::mover_mounts(&spec)),
                ..Default::default()
            }),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| EngineError::Api(format!("failed to create data mover: {e}")))?;
        let id = created.id;

        let outcome = self.run_to_completion(&id).await;

        let result = match outcome {
            Ok(0) => Ok(()),
            Ok(status) => {
                let logs = self.collect_logs(&id).await;
                Err(EngineError::NonZeroExit { status, logs })
            }
            Err(e) => Err(e),
        };

        // The mover is disposable whatever happened above.
        if let Err(e) = self
            .docker
            .remove_container(
                &id,
                Some(RemoveContainerOptions { force: true, ..Default::default() }),
            )
            .await
        {
            warn!(container = %id, error = %e, "failed to remove data mover container");
        }

        result
    }

    async fn pull_image(&self, reference: &str) -> Result<(), EngineError> {
        info!(image = %reference, "pulling image");
        let options = Some(CreateImageOptions {
            from_image: reference.to_string(),
            ..Default::default()
        });
        let mut stream = self.docker.create_image(options, None, None);
        while let Some(progress) = stream.next().await {
            progress.map_err(|e| EngineError::Api(format!("failed to pull {reference}: {e}")))?;
        }
        Ok(())
    }
}

fn summarize(volume: bollard::models::Volume) -> VolumeSummary {
    let created_at = volume
        .created_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));
    VolumeSummary {
        name: volume.name,
        driver: volume.driver,
        mountpoint: volume.mountpoint,
        created_at,
    }
}
