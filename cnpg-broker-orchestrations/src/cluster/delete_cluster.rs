use tracing::info;

use super::ClusterAdapter;
use crate::names;
use crate::platform::PlatformResult;

impl ClusterAdapter {
    /// Delete the instance namespace; the platform cascades to its contents
    pub async fn delete_cluster(&self, instance_id: &str) -> PlatformResult<()> {
        info!(instance_id, "Deleting cluster namespace");
        self.platform
            .delete_namespace(names::namespace(instance_id))
            .await
    }
}
