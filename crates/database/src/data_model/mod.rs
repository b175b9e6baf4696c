use std::fmt::Debug;

use model::WithId;
use serde::Serialize;
use utility::id::{HasId, Id};

pub mod location;
pub mod stop;
pub mod vehicle;
pub mod waypoint;

pub trait DatabaseRow {
    type Model: Serialize + HasId;

    fn get_id(&self) -> Id<Self::Model>;
    fn to_model(self) -> Self::Model;
}

pub fn with_ids<R: DatabaseRow>(rows: Vec<R>) -> Vec<WithId<R::Model>>
where
    <R::Model as HasId>::IdType: Debug + Clone + Serialize,
{
    rows.into_iter().map(|row| with_id(row)).collect::<Vec<_>>()
}

pub fn with_id<R: DatabaseRow>(row: R) -> WithId<R::Model>
where
    <R::Model as HasId>::IdType: Debug + Clone + Serialize,
{
    WithId::new(row.get_id(), row.to_model())
}

/// Implements `Repo` for the autocommit and the transaction handle by
/// delegating to the query functions of a module.
macro_rules! repo {
    ($model:ty, $queries:ident) => {
        #[async_trait::async_trait]
        impl tracker::database::Repo<$model> for crate::PgDatabaseAutocommit {
            async fn get(
                &mut self,
                id: utility::id::Id<$model>,
            ) -> tracker::database::Result<$model> {
                crate::queries::$queries::get(&self.pool, id).await
            }

            async fn get_all(
                &mut self,
            ) -> tracker::database::Result<Vec<model::WithId<$model>>> {
                crate::queries::$queries::get_all(&self.pool).await
            }

            async fn insert(
                &mut self,
                element: $model,
            ) -> tracker::database::Result<model::WithId<$model>> {
                crate::queries::$queries::insert(&self.pool, element).await
            }

            async fn put(
                &mut self,
                element: model::WithId<$model>,
            ) -> tracker::database::Result<model::WithId<$model>> {
                crate::queries::$queries::put(&self.pool, element).await
            }

            async fn exists(
                &mut self,
                id: utility::id::Id<$model>,
            ) -> tracker::database::Result<bool> {
                crate::queries::$queries::exists(&self.pool, id).await
            }
        }

        #[async_trait::async_trait]
        impl<'a> tracker::database::Repo<$model> for crate::PgDatabaseTransaction<'a> {
            async fn get(
                &mut self,
                id: utility::id::Id<$model>,
            ) -> tracker::database::Result<$model> {
                crate::queries::$queries::get(&mut *self.tx, id).await
            }

            async fn get_all(
                &mut self,
            ) -> tracker::database::Result<Vec<model::WithId<$model>>> {
                crate::queries::$queries::get_all(&mut *self.tx).await
            }

            async fn insert(
                &mut self,
                element: $model,
            ) -> tracker::database::Result<model::WithId<$model>> {
                crate::queries::$queries::insert(&mut *self.tx, element).await
            }

            async fn put(
                &mut self,
                element: model::WithId<$model>,
            ) -> tracker::database::Result<model::WithId<$model>> {
                crate::queries::$queries::put(&mut *self.tx, element).await
            }

            async fn exists(
                &mut self,
                id: utility::id::Id<$model>,
            ) -> tracker::database::Result<bool> {
                crate::queries::$queries::exists(&mut *self.tx, id).await
            }
        }
    };
}

pub(crate) use repo;
