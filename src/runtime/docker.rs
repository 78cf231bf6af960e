//! Docker implementation of the container runtime boundary

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, RemoveContainerOptions, StartContainerOptions,
    WaitContainerOptions,
};
use bollard::models::HostConfig;
use bollard::Docker;
use futures::StreamExt;
use uuid::Uuid;

use crate::job::JobSpec;

use super::{ContainerHandle, ContainerRuntime, LaunchError, LogFetchError, RemovalError, WaitError};

/// Container runtime backed by the local Docker daemon
///
/// The underlying client is a cheap handle over one connection and is safe
/// to share across workers.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl std::fmt::Debug for DockerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockerRuntime").finish_non_exhaustive()
    }
}

impl DockerRuntime {
    /// Connect using the local daemon defaults (unix socket or named pipe)
    pub fn connect() -> Result<Self, LaunchError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    /// Wrap an existing Docker client
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn start(&self, image: &str, spec: &JobSpec) -> Result<ContainerHandle, LaunchError> {
        let name = format!("dispatch-{}", Uuid::new_v4());
        let binds: Vec<String> = spec.mounts.iter().map(|m| m.bind_arg()).collect();

        let config = Config {
            image: Some(image.to_string()),
            cmd: Some(spec.arguments.clone()),
            host_config: Some(HostConfig {
                binds: Some(binds),
                ..Default::default()
            }),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: name.as_str(),
            platform: None,
        };

        let created = self.docker.create_container(Some(options), config).await?;
        self.docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await?;

        Ok(ContainerHandle {
            id: created.id,
            name,
        })
    }

    async fn wait(&self, handle: &ContainerHandle) -> Result<i64, WaitError> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(&handle.id, Some(options));
        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // A non-zero exit is a job outcome, not a runtime failure;
            // bollard reports it as a wait error carrying the code.
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(e.into()),
            None => Err(WaitError::Failed(format!(
                "wait stream for container {} ended without a status",
                handle.name
            ))),
        }
    }

    async fn fetch_log(&self, handle: &ContainerHandle) -> Result<Vec<u8>, LogFetchError> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            timestamps: true,
            ..Default::default()
        };

        let mut stream = self.docker.logs(&handle.id, Some(options));
        let mut bytes = Vec::new();
        while let Some(output) = stream.next().await {
            bytes.extend_from_slice(&output?.into_bytes());
        }

        Ok(bytes)
    }

    async fn remove(&self, handle: &ContainerHandle) -> Result<(), RemovalError> {
        self.docker
            .remove_container(&handle.id, None::<RemoveContainerOptions>)
            .await?;
        Ok(())
    }
}
