//! MongoDB repository for user accounts.

use async_trait::async_trait;
use bson::doc;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use tracing::info;

use jobify_models::{normalize_email, NewUser, ProfileUpdate, User, UserRecord};

use crate::documents::{parse_id, UserDocument, USERS};
use crate::error::{StoreError, StoreResult};
use crate::repos::UserStore;

/// Repository for `users` documents.
pub struct MongoUserRepository {
    users: Collection<UserDocument>,
}

impl MongoUserRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            users: database.collection(USERS),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserRepository {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let doc = UserDocument::from_new(user);
        self.users
            .insert_one(&doc)
            .await
            .map_err(|e| StoreError::from_write(e, "email"))?;
        info!("Created user record: {}", doc.id);
        Ok(doc.into_user())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<UserRecord>> {
        let doc = self
            .users
            .find_one(doc! { "email": normalize_email(email) })
            .await?;
        Ok(doc.map(UserDocument::into_record))
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let oid = parse_id(id)?;
        let doc = self.users.find_one(doc! { "_id": oid }).await?;
        Ok(doc.map(UserDocument::into_user))
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> StoreResult<Option<User>> {
        let oid = parse_id(id)?;
        let doc = self
            .users
            .find_one_and_update(
                doc! { "_id": oid },
                doc! { "$set": {
                    "name": update.name.clone(),
                    "email": normalize_email(&update.email),
                    "lastName": update.last_name.clone(),
                    "location": update.location.clone(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| StoreError::from_write(e, "email"))?;
        Ok(doc.map(UserDocument::into_user))
    }
}
