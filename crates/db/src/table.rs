use sea_query::Iden;

#[derive(Iden, Clone)]
pub enum Account {
    Table,
    Id,
    Role,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Speciality,
    IsActive,
    LastLogin,
    CreatedAt,
}
