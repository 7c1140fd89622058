use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::api;
use crate::permission::Action;
use crate::sec::Operator;
use crate::share::ShareRepository;
use crate::share::service::check_status;

use super::{Authentication, AuthenticationProvider, SystemResource, SystemResourceKind};

/// the sharing user can do anything with a share, everyone else may only
/// read it while it has not expired
pub struct ShareAuthenticationProvider {
    shares: Arc<dyn ShareRepository>,
}

impl ShareAuthenticationProvider {
    pub fn new(shares: Arc<dyn ShareRepository>) -> Self {
        ShareAuthenticationProvider { shares }
    }
}

impl AuthenticationProvider for ShareAuthenticationProvider {
    fn supports(&self, kind: SystemResourceKind) -> bool {
        kind == SystemResourceKind::StorageShare
    }

    fn authenticate<'a>(
        &'a self,
        resource: &'a SystemResource,
        operator: &'a Operator,
        action: Action,
    ) -> BoxFuture<'a, api::Result<Authentication>> {
        Box::pin(async move {
            let Some(share) = self.shares.find(resource.id).await? else {
                return Err(api::Error::api(api::ShareKind::NotFound));
            };

            if share.user_id == operator.user_id {
                return Ok(Authentication::new(*resource, *operator, true));
            }

            check_status(Some(share))?;

            Ok(Authentication::new(*resource, *operator, !action.is_write()))
        })
    }
}
