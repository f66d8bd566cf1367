use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};

use chrono::{DateTime, Utc};
use diesel::connection::TransactionManager;
use diesel::prelude::*;
use diesel::r2d2::{Builder as PoolBuilder, ConnectionManager, Pool, PooledConnection};
use diesel::sql_types::Text;
use tokio::task::block_in_place;
use tracing::{event, Level};

use crate::auth::{Store, TokenWriter};
use crate::core::models::{AccessToken, Client, RefreshToken, User};
use crate::core::types::ClientId;
use crate::provider::error::Error;

use super::models;
use super::schema;

embed_migrations!("migrations");

type PgPool = Pool<ConnectionManager<PgConnection>>;

const PERMITTED_TOKEN_QUERY: &str = "\
SELECT oat.access_token, oat.client_id, oat.user_id, oat.expires, oat.scope \
FROM oauth_access_tokens oat \
JOIN user_roles ur ON ur.user_id = oat.user_id \
JOIN role_permissions rp ON rp.role_id = ur.role_id \
JOIN permissions p ON p.id = rp.permission_id \
WHERE oat.access_token = $1 \
AND p.method = $2 \
AND left($3, length(p.endpoint)) = p.endpoint \
ORDER BY length(p.endpoint) DESC, p.id ASC \
LIMIT 1";

/// PostgreSQL store. Token lookups for permission checks go to the read
/// pool when one is configured.
pub struct DbStore {
    pool: PgPool,
    read_pool: Option<PgPool>,
}

fn build_pool(uri: &str) -> Result<PgPool, Error> {
    Ok(PoolBuilder::new()
        .max_size(10)
        .build(ConnectionManager::new(uri))?)
}

impl DbStore {
    pub fn acquire(uri: &str, read_uri: Option<&str>) -> Result<Self, Error> {
        let pool = build_pool(uri)?;
        let read_pool = read_uri.map(build_pool).transpose()?;
        Ok(Self { pool, read_pool })
    }

    fn conn(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, Error> {
        Ok(self.pool.get()?)
    }

    pub fn migrate(&self) -> Result<(), Error> {
        block_in_place(|| {
            embedded_migrations::run_with_output(&*self.conn()?, &mut std::io::stderr())
                .map_err(Error::storage)
        })?;
        event!(Level::INFO, "Ran migrations");
        Ok(())
    }
}

impl Debug for DbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbStore")
            .field("read_replica", &self.read_pool.is_some())
            .finish()
    }
}

fn insert_access_token(conn: &PgConnection, token: &AccessToken) -> Result<(), Error> {
    use schema::oauth_access_tokens::dsl::oauth_access_tokens;

    diesel::insert_into(oauth_access_tokens)
        .values(models::AccessToken::from(token))
        .execute(conn)?;
    Ok(())
}

fn insert_refresh_token(conn: &PgConnection, token: &RefreshToken) -> Result<(), Error> {
    use schema::oauth_refresh_tokens::dsl::oauth_refresh_tokens;

    diesel::insert_into(oauth_refresh_tokens)
        .values(models::RefreshToken::from(token))
        .execute(conn)?;
    Ok(())
}

fn update_access_expiry(conn: &PgConnection, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
    use schema::oauth_access_tokens::dsl::{self, oauth_access_tokens};

    let updated = diesel::update(oauth_access_tokens.find(token))
        .set(dsl::expires.eq(expires))
        .execute(conn)?;
    found_one(updated)
}

fn update_refresh_expiry(conn: &PgConnection, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
    use schema::oauth_refresh_tokens::dsl::{self, oauth_refresh_tokens};

    let updated = diesel::update(oauth_refresh_tokens.find(token))
        .set(dsl::expires.eq(expires))
        .execute(conn)?;
    found_one(updated)
}

fn found_one(updated: usize) -> Result<(), Error> {
    match updated {
        0 => Err(Error::TokenNotFound),
        _ => Ok(()),
    }
}

fn select_permitted_token(
    conn: &PgConnection,
    token: &str,
    method: &str,
    endpoint: &str,
) -> Result<Option<AccessToken>, Error> {
    let found = diesel::sql_query(PERMITTED_TOKEN_QUERY)
        .bind::<Text, _>(token)
        .bind::<Text, _>(method)
        .bind::<Text, _>(endpoint)
        .get_result::<models::AccessToken>(conn)
        .optional()?;

    Ok(found.map(Into::into))
}

/// Writer bound to the single connection a transaction runs on.
struct TxWriter<'a> {
    conn: &'a PgConnection,
}

impl TokenWriter for TxWriter<'_> {
    fn create_access_token(&self, token: &AccessToken) -> Result<(), Error> {
        insert_access_token(self.conn, token)
    }

    fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), Error> {
        insert_refresh_token(self.conn, token)
    }

    fn extend_access_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        update_access_expiry(self.conn, token, expires)
    }

    fn extend_refresh_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        update_refresh_expiry(self.conn, token, expires)
    }
}

impl TokenWriter for DbStore {
    fn create_access_token(&self, token: &AccessToken) -> Result<(), Error> {
        block_in_place(|| insert_access_token(&*self.conn()?, token))
    }

    fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), Error> {
        block_in_place(|| insert_refresh_token(&*self.conn()?, token))
    }

    fn extend_access_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        block_in_place(|| update_access_expiry(&*self.conn()?, token, expires))
    }

    fn extend_refresh_token_expiry(&self, token: &str, expires: DateTime<Utc>) -> Result<(), Error> {
        block_in_place(|| update_refresh_expiry(&*self.conn()?, token, expires))
    }
}

impl Store for DbStore {
    fn resolve_client(&self, id: &ClientId) -> Result<Option<Client>, Error> {
        use schema::oauth_clients::dsl::oauth_clients;

        let found = block_in_place(|| {
            oauth_clients
                .find(&id.0)
                .first::<models::Client>(&*self.conn()?)
                .optional()
                .map_err(Error::from)
        })?;

        Ok(found.map(Into::into))
    }

    fn resolve_user(&self, identifier: &str) -> Result<Option<User>, Error> {
        use schema::users::dsl::{email, telephone, username, users};

        let found = block_in_place(|| {
            let conn = self.conn()?;

            let by_username = users
                .filter(username.eq(identifier))
                .first::<models::User>(&*conn)
                .optional()?;
            if by_username.is_some() {
                return Ok::<_, Error>(by_username);
            }

            let by_email = users
                .filter(email.eq(identifier))
                .first::<models::User>(&*conn)
                .optional()?;
            if by_email.is_some() {
                return Ok(by_email);
            }

            Ok(users
                .filter(telephone.eq(identifier))
                .first::<models::User>(&*conn)
                .optional()?)
        })?;

        Ok(found.map(Into::into))
    }

    fn resolve_access_token(
        &self,
        token: &str,
        method: &str,
        endpoint: &str,
    ) -> Result<Option<AccessToken>, Error> {
        if let Some(read_pool) = &self.read_pool {
            let replica = block_in_place(|| {
                select_permitted_token(&*read_pool.get()?, token, method, endpoint)
            });
            match replica {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) => {}
                Err(e) => event!(Level::WARN, error = %e, "read replica lookup failed"),
            }
        }

        block_in_place(|| select_permitted_token(&*self.conn()?, token, method, endpoint))
    }

    fn resolve_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, Error> {
        use schema::oauth_refresh_tokens::dsl::oauth_refresh_tokens;

        let found = block_in_place(|| {
            oauth_refresh_tokens
                .find(token)
                .first::<models::RefreshToken>(&*self.conn()?)
                .optional()
                .map_err(Error::from)
        })?;

        Ok(found.map(Into::into))
    }

    fn with_transaction<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&dyn TokenWriter) -> Result<T, Error>,
    {
        block_in_place(|| {
            let pooled = self.conn()?;
            let conn: &PgConnection = &pooled;
            let manager = conn.transaction_manager();

            manager
                .begin_transaction(conn)
                .map_err(|e| Error::Transaction(Box::new(e)))?;

            let writer = TxWriter { conn };
            match panic::catch_unwind(AssertUnwindSafe(|| f(&writer))) {
                Ok(Ok(value)) => {
                    manager
                        .commit_transaction(conn)
                        .map_err(|e| Error::Transaction(Box::new(e)))?;
                    Ok(value)
                }
                Ok(Err(cause)) => match manager.rollback_transaction(conn) {
                    Ok(()) => Err(cause),
                    Err(e) => Err(Error::Rollback {
                        cause: Box::new(cause),
                        source: Box::new(e),
                    }),
                },
                Err(payload) => {
                    if let Err(e) = manager.rollback_transaction(conn) {
                        event!(Level::ERROR, error = %e, "rollback after panic failed");
                    }
                    panic::resume_unwind(payload)
                }
            }
        })
    }
}
