//! Read-only access to the network data backend.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use serde_json::Value;

use crate::error::ApiError;
use crate::records::{ConduitRecord, JunctionRecord, OutfallRecord, SubcatchmentRecord};

/// Boxed future returned by [`NetworkApi`]. Not `Send`: everything runs on the
/// viewer's thread.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// The collections fetched by a reload, in rebuild order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Junctions,
    Outfalls,
    Conduits,
    Subcatchments,
    Boundary,
}

impl Collection {
    pub const ORDER: [Collection; 5] = [
        Collection::Junctions,
        Collection::Outfalls,
        Collection::Conduits,
        Collection::Subcatchments,
        Collection::Boundary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Junctions => "junctions",
            Collection::Outfalls => "outfalls",
            Collection::Conduits => "conduits",
            Collection::Subcatchments => "subcatchments",
            Collection::Boundary => "boundary",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait NetworkApi {
    fn list_junctions(&self) -> BoxFuture<'_, Result<Vec<JunctionRecord>, ApiError>>;
    fn list_outfalls(&self) -> BoxFuture<'_, Result<Vec<OutfallRecord>, ApiError>>;
    fn list_conduits(&self) -> BoxFuture<'_, Result<Vec<ConduitRecord>, ApiError>>;
    fn list_subcatchments(&self) -> BoxFuture<'_, Result<Vec<SubcatchmentRecord>, ApiError>>;
    /// Raw boundary GeoJSON.
    fn get_boundary(&self) -> BoxFuture<'_, Result<Value, ApiError>>;
}

impl<A: NetworkApi + ?Sized> NetworkApi for Rc<A> {
    fn list_junctions(&self) -> BoxFuture<'_, Result<Vec<JunctionRecord>, ApiError>> {
        (**self).list_junctions()
    }

    fn list_outfalls(&self) -> BoxFuture<'_, Result<Vec<OutfallRecord>, ApiError>> {
        (**self).list_outfalls()
    }

    fn list_conduits(&self) -> BoxFuture<'_, Result<Vec<ConduitRecord>, ApiError>> {
        (**self).list_conduits()
    }

    fn list_subcatchments(&self) -> BoxFuture<'_, Result<Vec<SubcatchmentRecord>, ApiError>> {
        (**self).list_subcatchments()
    }

    fn get_boundary(&self) -> BoxFuture<'_, Result<Value, ApiError>> {
        (**self).get_boundary()
    }
}
