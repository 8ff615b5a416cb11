use anyhow::Context;
use attendance_tracker::auth::Home;
use attendance_tracker::catalog::SubjectForm;
use attendance_tracker::cli::{
    AccountArgs, AdminCommand, Cli, Command, DepartmentCommand, StudentAccountCommand,
    StudentCommand, SubjectCommand, TeacherAccountCommand, TeacherCommand,
};
use attendance_tracker::models::User;
use attendance_tracker::roster::StudentForm;
use attendance_tracker::{AttendanceManager, NewAccount, display};
use clap::Parser;
use std::fs::File;

fn main() -> anyhow::Result<()> {
    attendance_tracker::init_logging();

    let cli = Cli::parse();
    let mut manager = attendance_tracker::create_default_manager(cli.database.as_deref())
        .context("failed to open the attendance database")?;

    if let Command::Init = cli.command {
        manager.initialize()?;
        println!("Database ready.");
        return Ok(());
    }

    let identity = match cli.user.as_deref() {
        Some(username) => manager.resolve_identity(username)?,
        None => None,
    };

    run(&mut manager, identity.as_ref(), cli.command)?;
    Ok(())
}

fn account(args: AccountArgs, phone: Option<String>) -> NewAccount {
    NewAccount {
        username: args.username,
        email: args.email,
        first_name: args.first_name,
        last_name: args.last_name,
        phone,
    }
}

fn run(
    manager: &mut AttendanceManager,
    identity: Option<&User>,
    command: Command,
) -> attendance_tracker::Result<()> {
    match command {
        Command::Init => manager.initialize(),
        Command::Dashboard => {
            let role = identity
                .map(|user| user.role)
                .ok_or(attendance_tracker::Error::AccessDenied)?;
            match Home::for_role(role) {
                Home::AdminOverview => run(manager, identity, Command::Admin(AdminCommand::Overview)),
                Home::TeacherOverview => {
                    run(manager, identity, Command::Teacher(TeacherCommand::Overview))
                }
                Home::StudentDashboard => {
                    run(manager, identity, Command::Student(StudentCommand::Dashboard))
                }
            }
        }
        Command::Admin(command) => run_admin(manager, identity, command),
        Command::Teacher(command) => run_teacher(manager, identity, command),
        Command::Student(command) => run_student(manager, identity, command),
    }
}

fn run_admin(
    manager: &mut AttendanceManager,
    identity: Option<&User>,
    command: AdminCommand,
) -> attendance_tracker::Result<()> {
    match command {
        AdminCommand::Overview => display::show_admin_overview(&manager.admin_overview(identity)?),

        AdminCommand::Department(DepartmentCommand::Add { name, code }) => {
            let department = manager.create_department(identity, &name, &code)?;
            println!("Department {} added with id {}.", department.code, department.id);
        }
        AdminCommand::Department(DepartmentCommand::List) => {
            display::show_departments(&manager.list_departments(identity)?)
        }
        AdminCommand::Department(DepartmentCommand::Delete { id }) => {
            let department = manager.delete_department(identity, id)?;
            println!("Department {} deleted.", department.code);
        }

        AdminCommand::Subject(SubjectCommand::Add {
            name,
            code,
            department,
            teacher,
            semester,
        }) => {
            let subject = manager.create_subject(
                identity,
                &SubjectForm {
                    name,
                    code,
                    department_id: department,
                    teacher_id: teacher,
                    semester,
                },
            )?;
            println!("Subject {} added with id {}.", subject.code, subject.id);
        }
        AdminCommand::Subject(SubjectCommand::List) => {
            display::show_subjects(&manager.list_subjects(identity)?)
        }
        AdminCommand::Subject(SubjectCommand::Delete { id }) => {
            let subject = manager.delete_subject(identity, id)?;
            println!("Subject {} deleted.", subject.code);
        }

        AdminCommand::Teacher(TeacherAccountCommand::Add { account: args, phone }) => {
            let teacher = manager.create_teacher(identity, &account(args, phone))?;
            println!("Teacher {} added with id {}.", teacher.username, teacher.id);
        }
        AdminCommand::Teacher(TeacherAccountCommand::List) => {
            display::show_teachers(&manager.list_teachers(identity)?)
        }
        AdminCommand::Teacher(TeacherAccountCommand::Delete { id }) => {
            let teacher = manager.delete_teacher(identity, id)?;
            println!("Teacher {} deleted.", teacher.username);
        }

        AdminCommand::Student(StudentAccountCommand::Add {
            account: args,
            roll_number,
            department,
            semester,
            joining_year,
        }) => {
            let profile = manager.create_student(
                identity,
                &StudentForm {
                    account: account(args, None),
                    roll_number,
                    department_id: department,
                    semester,
                    joining_year,
                },
            )?;
            println!(
                "Student {} added with id {}.",
                profile.student.roll_number, profile.student.id
            );
        }
        AdminCommand::Student(StudentAccountCommand::List) => {
            display::show_students(&manager.list_students(identity)?)
        }
        AdminCommand::Student(StudentAccountCommand::Delete { id }) => {
            let profile = manager.delete_student(identity, id)?;
            println!("Student {} deleted.", profile.student.roll_number);
        }
        AdminCommand::Student(StudentAccountCommand::Import { file_path }) => {
            let file = File::open(&file_path)?;
            display::show_import(&manager.import_students(identity, file)?);
        }
    }

    Ok(())
}

fn run_teacher(
    manager: &mut AttendanceManager,
    identity: Option<&User>,
    command: TeacherCommand,
) -> attendance_tracker::Result<()> {
    match command {
        TeacherCommand::Overview => {
            display::show_teacher_overview(&manager.teacher_overview(identity)?)
        }
        TeacherCommand::Roster { subject, date } => {
            display::show_marking_sheet(&manager.prepare_marking(identity, subject, date)?)
        }
        TeacherCommand::Mark {
            subject,
            date,
            present,
            only,
        } => {
            let sheet = manager.prepare_marking(identity, subject, date)?;
            let submission = sheet.submission(&present, &only)?;
            let outcome = manager.mark_attendance(identity, &submission)?;
            display::show_marking_outcome(&sheet.subject.name, &outcome);
        }
        TeacherCommand::Report { subject, csv } => {
            let report = manager.teacher_report(identity, subject)?;
            display::show_teacher_report(&report);
            if let Some(path) = csv {
                report.write_csv(File::create(&path)?)?;
                println!("Report written to {}.", path.display());
            }
        }
    }

    Ok(())
}

fn run_student(
    manager: &mut AttendanceManager,
    identity: Option<&User>,
    command: StudentCommand,
) -> attendance_tracker::Result<()> {
    match command {
        StudentCommand::Dashboard => {
            display::show_student_dashboard(&manager.student_dashboard(identity)?)
        }
        StudentCommand::Detail { subject } => {
            display::show_subject_detail(&manager.student_subject_detail(identity, subject)?)
        }
    }

    Ok(())
}
