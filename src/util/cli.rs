use clap::Parser;
use diesel::prelude::*;
use diesel::PgConnection;

use crate::core::types::{ClientSecret, GrantType, Password};
use crate::db::models;
use crate::db::schema;
use crate::provider::error::Error;
use crate::util::hash::HashingService;
use crate::util::random::FromRandom;

#[derive(Parser)]
#[clap(
    name = "kagi-util",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS")
)]
pub struct Options {
    #[clap(env = "DATABASE_URL")]
    database_url: String,
    #[clap(env = "HASH_SECRET", hide_env_values = true)]
    hash_secret: String,
    #[clap(subcommand)]
    command: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    ListClients(ListClients),
    CreateClient(CreateClient),
    DeleteClient(DeleteClient),
    CreateUser(CreateUser),
    GrantPermission(GrantPermission),
    AssignRole(AssignRole),
}

#[derive(Parser)]
struct ListClients;

#[derive(Parser)]
struct CreateClient {
    #[clap(short, long)]
    id: String,
    /// Generated and printed when omitted
    #[clap(short, long)]
    secret: Option<String>,
    #[clap(short, long, default_value = "")]
    redirect_uri: String,
    /// Comma separated; empty allows every grant
    #[clap(short, long, default_value = "")]
    grant_types: String,
}

#[derive(Parser)]
struct DeleteClient {
    #[clap(short, long)]
    id: String,
}

#[derive(Parser)]
struct CreateUser {
    #[clap(short, long)]
    id: String,
    #[clap(short, long)]
    username: String,
    #[clap(short, long)]
    email: Option<String>,
    #[clap(short, long)]
    telephone: Option<String>,
    #[clap(short, long)]
    password: String,
}

#[derive(Parser)]
struct GrantPermission {
    #[clap(short, long)]
    role: String,
    #[clap(short, long)]
    method: String,
    /// Endpoint prefix the permission covers
    #[clap(short, long)]
    endpoint: String,
}

#[derive(Parser)]
struct AssignRole {
    #[clap(short, long)]
    user: String,
    #[clap(short, long)]
    role: String,
}

fn get_database(uri: &str) -> Result<PgConnection, Error> {
    PgConnection::establish(uri).map_err(Error::storage)
}

fn get_hasher(secret: &str) -> HashingService {
    HashingService::with_secret_key(secret.to_string())
}

fn list_clients(_c: &ListClients, opts: &Options) -> Result<(), Error> {
    use schema::oauth_clients::dsl::{client_id, oauth_clients};

    let db = get_database(&opts.database_url)?;

    let results = oauth_clients
        .order(client_id)
        .get_results::<models::Client>(&db)?;

    for client in results {
        let grants = match client.grant_types.as_str() {
            "" => "any",
            g => g,
        };
        println!("{} (grants: {})", client.client_id, grants);
    }
    Ok(())
}

fn create_client(c: &CreateClient, opts: &Options) -> Result<(), Error> {
    use schema::oauth_clients::dsl::oauth_clients;

    for tag in c.grant_types.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let _: GrantType = tag.parse()?;
    }

    let db = get_database(&opts.database_url)?;

    let secret = match &c.secret {
        Some(s) => ClientSecret(s.to_string()),
        None => {
            let generated = ClientSecret::from_random();
            println!("secret: {}", generated.as_ref());
            generated
        }
    };

    let model = models::Client {
        client_id: c.id.to_string(),
        client_secret: secret.0,
        redirect_uri: c.redirect_uri.to_string(),
        grant_types: c.grant_types.to_string(),
    };

    diesel::insert_into(oauth_clients)
        .values(model)
        .execute(&db)?;
    Ok(())
}

fn delete_client(c: &DeleteClient, opts: &Options) -> Result<(), Error> {
    use schema::oauth_clients::dsl::oauth_clients;

    let db = get_database(&opts.database_url)?;

    diesel::delete(oauth_clients.find(&c.id)).execute(&db)?;
    Ok(())
}

fn create_user(c: &CreateUser, opts: &Options) -> Result<(), Error> {
    use schema::users::dsl::users;

    let db = get_database(&opts.database_url)?;
    let hasher = get_hasher(&opts.hash_secret);

    let password_hash = hasher
        .hash(&Password(c.password.to_string()))
        .map_err(Error::storage)?
        .0;

    let model = models::User {
        id: c.id.to_string(),
        username: c.username.to_string(),
        email: c.email.clone(),
        telephone: c.telephone.clone(),
        password_hash,
    };

    diesel::insert_into(users).values(model).execute(&db)?;
    Ok(())
}

fn ensure_role(db: &PgConnection, role: &str) -> Result<i32, Error> {
    use schema::roles::dsl::{id, name, roles};

    diesel::insert_into(roles)
        .values(models::NewRole { name: role })
        .on_conflict(name)
        .do_nothing()
        .execute(db)?;

    Ok(roles.filter(name.eq(role)).select(id).first(db)?)
}

fn grant_permission(c: &GrantPermission, opts: &Options) -> Result<(), Error> {
    use schema::permissions::dsl::{endpoint, id, method, permissions};
    use schema::role_permissions::dsl::role_permissions;

    let db = get_database(&opts.database_url)?;

    db.transaction::<_, Error, _>(|| {
        let role_id = ensure_role(&db, &c.role)?;

        diesel::insert_into(permissions)
            .values(models::NewPermission {
                method: &c.method,
                endpoint: &c.endpoint,
            })
            .on_conflict((method, endpoint))
            .do_nothing()
            .execute(&db)?;
        let permission_id = permissions
            .filter(method.eq(&c.method).and(endpoint.eq(&c.endpoint)))
            .select(id)
            .first::<i32>(&db)?;

        diesel::insert_into(role_permissions)
            .values(models::RolePermission {
                role_id,
                permission_id,
            })
            .on_conflict_do_nothing()
            .execute(&db)?;
        Ok(())
    })
}

fn assign_role(c: &AssignRole, opts: &Options) -> Result<(), Error> {
    use schema::user_roles::dsl::user_roles;

    let db = get_database(&opts.database_url)?;

    db.transaction::<_, Error, _>(|| {
        let role_id = ensure_role(&db, &c.role)?;

        diesel::insert_into(user_roles)
            .values(models::UserRole {
                user_id: c.user.to_string(),
                role_id,
            })
            .on_conflict_do_nothing()
            .execute(&db)?;
        Ok(())
    })
}

pub fn run_cli_action(opts: Options) -> Result<(), Error> {
    use SubCommand::*;

    match &opts.command {
        ListClients(c) => list_clients(c, &opts),
        CreateClient(c) => create_client(c, &opts),
        DeleteClient(c) => delete_client(c, &opts),
        CreateUser(c) => create_user(c, &opts),
        GrantPermission(c) => grant_permission(c, &opts),
        AssignRole(c) => assign_role(c, &opts),
    }
}
